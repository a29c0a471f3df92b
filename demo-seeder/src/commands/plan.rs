//! Plan command - Show what a seed run would create, without credentials or network

use colored::Colorize;

use crate::demo_graph::demo_graph;
use crate::hierarchy::Hierarchy;
use crate::setup::{resolve_config, ConfigOverrides, SetupError};
use crate::tree_renderer::render_plan_tree;
use crate::types::HierarchyNode;

pub fn run(overrides: &ConfigOverrides<'_>, json: bool) -> anyhow::Result<()> {
    let config = resolve_config(overrides)?;
    let hierarchy = Hierarchy::new(demo_graph(&config)).map_err(SetupError::from)?;

    println!("{}", "\nDry run - nothing will be created\n".bold());
    let header = format!("Creation plan ({} work items):", hierarchy.len());
    println!("{}", render_plan_tree(&hierarchy, &header));
    println!();

    println!("{}", "Creation order:".bold());
    for line in order_lines(&hierarchy) {
        println!("  {line}");
    }

    if let Some(team_path) = config.team_path() {
        println!(
            "{}",
            format!("\nArea and iteration path: {team_path}").dimmed()
        );
    }
    if config.extended_fields {
        println!("{}", "Extended planning fields enabled".dimmed());
    }

    if json {
        let nodes: Vec<&HierarchyNode> = hierarchy.ordered().collect();
        println!("{}", serde_json::to_string_pretty(&nodes)?);
    }

    println!("{}", "\nRun without --dry-run to create these work items".dimmed());
    Ok(())
}

/// Numbered creation order with the link each node will request.
pub fn order_lines(hierarchy: &Hierarchy) -> Vec<String> {
    hierarchy
        .ordered()
        .enumerate()
        .map(|(index, node)| {
            let link = match &node.parent {
                Some(parent) => format!(" -> {} {parent}", node.link),
                None => String::new(),
            };
            format!(
                "{:>2}. {} ({}){}",
                index + 1,
                node.key,
                node.item.work_item_type,
                link
            )
        })
        .collect()
}
