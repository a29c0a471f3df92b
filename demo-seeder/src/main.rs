pub mod azure_devops;
pub mod builder;
pub mod commands;
pub mod config;
pub mod creator;
pub mod demo_graph;
pub mod hierarchy;
pub mod setup;
pub mod tree_renderer;
pub mod types;

use std::env;
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::commands::seed::SeedOptions;
use crate::setup::ConfigOverrides;

#[derive(Parser)]
#[command(
    name = "demo-seeder",
    version,
    about = "Seed an Azure DevOps project with a demo work item hierarchy",
    long_about = "Creates epics, features, backlog items, tasks, a test case and a bug, \
                  linked into a hierarchy. Individual failures are reported and the run continues."
)]
struct Cli {
    /// Path to a config file (default: seeder.config.yaml, then the global config)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Azure DevOps organization (overrides config and AZURE_DEVOPS_ORG)
    #[arg(long)]
    org: Option<String>,

    /// Azure DevOps project (overrides config and AZURE_DEVOPS_PROJECT)
    #[arg(long)]
    project: Option<String>,

    /// Print the creation plan without contacting Azure DevOps
    #[arg(long)]
    dry_run: bool,

    /// Skip the connection check before creating work items
    #[arg(long)]
    skip_preflight: bool,

    /// Also print the final report as JSON
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("DEMO_SEEDER_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "demo_seeder=debug,warn"
        } else {
            "warn"
        })
    });

    let format = env::var("DEMO_SEEDER_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let overrides = ConfigOverrides {
        config_path: cli.config.as_deref(),
        organization: cli.org.as_deref(),
        project: cli.project.as_deref(),
    };

    if cli.dry_run {
        if let Err(e) = commands::plan::run(&overrides, cli.json) {
            eprintln!("Plan error: {}", e);
            std::process::exit(1);
        }
        return;
    }

    let options = SeedOptions {
        overrides,
        skip_preflight: cli.skip_preflight,
        json: cli.json,
    };
    if let Err(e) = commands::seed::run(&options) {
        eprintln!("Setup error: {}", e);
        std::process::exit(1);
    }
}
