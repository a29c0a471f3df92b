//! Seed command - Create the demo hierarchy in Azure DevOps

use colored::{ColoredString, Colorize};

use crate::azure_devops::AzureDevOpsClient;
use crate::builder::{BuildObserver, BuildReport, HierarchyBuilder, NodeReport};
use crate::demo_graph::demo_graph;
use crate::hierarchy::Hierarchy;
use crate::setup::{connect, load_config, preflight, ConfigOverrides, SetupError};
use crate::tree_renderer::{render_legend, render_report_tree};
use crate::types::{HierarchyNode, NodeState, Relation, SeederConfig};

pub struct SeedOptions<'a> {
    pub overrides: ConfigOverrides<'a>,
    pub skip_preflight: bool,
    pub json: bool,
}

/// Prints one line per attempt and outcome while the build runs.
struct ConsoleObserver {
    total: usize,
    attempted: usize,
}

impl ConsoleObserver {
    fn new(total: usize) -> Self {
        Self {
            total,
            attempted: 0,
        }
    }
}

impl BuildObserver for ConsoleObserver {
    fn on_attempt(&mut self, node: &HierarchyNode, relations: &[Relation]) {
        self.attempted += 1;
        let progress = format!("[{}/{}]", self.attempted, self.total);
        println!(
            "{} Creating {}: {}{}",
            progress.dimmed(),
            node.item.work_item_type,
            node.item.title,
            describe_links(node, relations)
        );
    }

    fn on_outcome(&mut self, report: &NodeReport) {
        match &report.state {
            NodeState::Created(id) if report.is_degraded() => {
                println!("{}", format!("  ✓ Created #{id}").green());
                println!(
                    "{}",
                    format!(
                        "  ! {} requested link(s) were not stored",
                        report.missing_relations.len()
                    )
                    .yellow()
                );
            }
            NodeState::Created(id) => println!("{}", format!("  ✓ Created #{id}").green()),
            NodeState::Failed(reason) => println!("{}", format!("  ✗ Failed: {reason}").red()),
            NodeState::Pending => {}
        }
    }
}

fn describe_links(node: &HierarchyNode, relations: &[Relation]) -> String {
    match (&node.parent, relations.first()) {
        (None, _) => String::new(),
        (Some(_), Some(relation)) => {
            format!(" ({} #{})", relation.kind, relation.target)
                .dimmed()
                .to_string()
        }
        (Some(parent), None) => format!(" ({parent} unavailable, creating without link)")
            .yellow()
            .to_string(),
    }
}

pub fn run(options: &SeedOptions<'_>) -> anyhow::Result<()> {
    let config = load_config(&options.overrides)?;
    let hierarchy = Hierarchy::new(demo_graph(&config)).map_err(SetupError::from)?;
    let client = connect(config)?;

    print_header(client.config());

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let report = rt.block_on(seed_with(&client, &hierarchy, options.skip_preflight))?;

    println!();
    println!(
        "{}",
        render_report_tree(&hierarchy, &report, "Demo hierarchy:")
    );
    println!();
    println!("{}", render_legend());
    println!();
    print_summary(&report, client.config());

    if options.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}

/// Check the connection, then build the hierarchy.
///
/// Only a failed connection check is an error; node failures are part of the
/// returned report.
pub async fn seed_with(
    client: &AzureDevOpsClient,
    hierarchy: &Hierarchy,
    skip_preflight: bool,
) -> Result<BuildReport, SetupError> {
    if skip_preflight {
        println!("{}", "Skipping connection check".dimmed());
    } else {
        let project = preflight(client).await?;
        println!(
            "{}",
            format!("Connected to project {} ({})", project.name, project.id).green()
        );
    }
    println!();

    let mut observer = ConsoleObserver::new(hierarchy.len());
    Ok(HierarchyBuilder::new(client, hierarchy)
        .build(&mut observer)
        .await)
}

fn print_header(config: &SeederConfig) {
    println!("{}", "\nAzure DevOps demo seeder\n".bold());
    println!("  organization:  {}", config.organization.cyan());
    println!("  project:       {}", config.project.cyan());
    if let Some(team) = &config.team {
        println!("  team:          {}", team.cyan());
    }
    println!();
}

/// One `key: id` line per node, `absent` for nodes that were not created.
pub fn summary_lines(report: &BuildReport) -> Vec<String> {
    report
        .summary()
        .into_iter()
        .map(|(key, identity)| match identity {
            Some(id) => format!("{key}: {id}"),
            None => format!("{key}: absent"),
        })
        .collect()
}

/// Overall outcome line: green when complete, yellow when partial, red when nothing was created.
fn headline(report: &BuildReport) -> ColoredString {
    let created = report.created_count();
    let failed = report.failed_count();
    let total = report.nodes.len();
    if failed == 0 {
        format!("Created all {created} work item(s)").green()
    } else if created == 0 {
        format!("Failed to create all {failed} work item(s)").red()
    } else {
        format!("Created {created} of {total} work item(s), {failed} failed").yellow()
    }
}

/// One `key: reason` line per failed node.
pub fn failure_lines(report: &BuildReport) -> Vec<String> {
    report
        .failed()
        .filter_map(|node| {
            node.state
                .failure_reason()
                .map(|reason| format!("{}: {reason}", node.key))
        })
        .collect()
}

fn print_summary(report: &BuildReport, config: &SeederConfig) {
    println!("{}", "Summary:".bold());
    for line in summary_lines(report) {
        if line.ends_with("absent") {
            println!("  {}", line.red());
        } else {
            println!("  {line}");
        }
    }
    println!();

    println!("{}", headline(report));

    for line in failure_lines(report) {
        println!("  {}", line.dimmed());
    }

    let degraded = report.degraded().count();
    if degraded > 0 {
        println!(
            "{}",
            format!("{degraded} work item(s) are missing requested links").yellow()
        );
    }

    if report.created_count() > 0 {
        println!("\nView your work items at: {}", config.board_url().cyan());
    }
}
