use colored::{Colorize, CustomColor};

use crate::builder::{BuildReport, NodeReport};
use crate::hierarchy::Hierarchy;
use crate::types::{HierarchyNode, NodeState, RelationKind};

// Nord color palette
// https://www.nordtheme.com/docs/colors-and-palettes

// Polar Night (dark)
const NORD3: CustomColor = CustomColor {
    r: 76,
    g: 86,
    b: 106,
};

// Snow Storm (light)
const NORD4: CustomColor = CustomColor {
    r: 216,
    g: 222,
    b: 233,
};
const NORD6: CustomColor = CustomColor {
    r: 236,
    g: 239,
    b: 244,
};

// Frost - depth coloring
const NORD7: CustomColor = CustomColor {
    r: 143,
    g: 188,
    b: 187,
}; // teal
const NORD8: CustomColor = CustomColor {
    r: 136,
    g: 192,
    b: 208,
}; // light blue
const NORD9: CustomColor = CustomColor {
    r: 129,
    g: 161,
    b: 193,
}; // blue
const NORD10: CustomColor = CustomColor {
    r: 94,
    g: 129,
    b: 172,
}; // dark blue

// Aurora - status
const NORD11: CustomColor = CustomColor {
    r: 191,
    g: 97,
    b: 106,
}; // red
const NORD13: CustomColor = CustomColor {
    r: 235,
    g: 203,
    b: 139,
}; // yellow
const NORD14: CustomColor = CustomColor {
    r: 163,
    g: 190,
    b: 140,
}; // green

/// One color per hierarchy level: epic, feature, backlog item, leaf
const DEPTH_COLORS: [CustomColor; 4] = [NORD8, NORD7, NORD9, NORD10];

/// Display status of a node in a rendered tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Planned,
    Created,
    Degraded,
    Failed,
}

impl Mark {
    fn of(report: &NodeReport) -> Self {
        match report.state {
            NodeState::Pending => Mark::Planned,
            NodeState::Failed(_) => Mark::Failed,
            NodeState::Created(_) if report.is_degraded() => Mark::Degraded,
            NodeState::Created(_) => Mark::Created,
        }
    }

    fn color(self) -> CustomColor {
        match self {
            Mark::Planned => NORD3,
            Mark::Created => NORD14,
            Mark::Degraded => NORD13,
            Mark::Failed => NORD11,
        }
    }

    fn icon(self) -> String {
        let icon = match self {
            Mark::Planned => "[·]",
            Mark::Created => "[✓]",
            Mark::Degraded => "[~]",
            Mark::Failed => "[✗]",
        };
        icon.custom_color(self.color()).to_string()
    }
}

fn color_key(key: &str, depth: usize) -> String {
    let color = DEPTH_COLORS[depth % DEPTH_COLORS.len()];
    key.custom_color(color).bold().to_string()
}

fn dim(text: &str) -> String {
    text.custom_color(NORD3).to_string()
}

/// Non-hierarchical links are called out; parent links are implied by the tree
fn link_suffix(node: &HierarchyNode) -> String {
    match &node.parent {
        Some(parent) if !node.link.is_hierarchical() => {
            let label = match node.link {
                RelationKind::TestedBy => "tests",
                _ => "related to",
            };
            dim(&format!(" ({label} {parent})"))
        }
        _ => String::new(),
    }
}

fn outcome_suffix(report: &NodeReport) -> String {
    let mut suffix = match &report.state {
        NodeState::Created(id) => format!(" #{id}").custom_color(NORD14).to_string(),
        NodeState::Failed(reason) => format!(" failed: {reason}").custom_color(NORD11).to_string(),
        NodeState::Pending => String::new(),
    };
    if let (true, Some(parent)) = (report.parent_unavailable(), &report.parent) {
        suffix.push_str(&dim(&format!(" (unlinked, {parent} unavailable)")));
    }
    if report.is_degraded() {
        let kinds: Vec<String> = report
            .missing_relations
            .iter()
            .map(|r| format!("{} #{}", r.kind, r.target))
            .collect();
        suffix.push_str(
            &format!(" (links not stored: {})", kinds.join(", "))
                .custom_color(NORD13)
                .to_string(),
        );
    }
    suffix
}

/// Walk the hierarchy depth-first from its roots, calling `line` for each node
fn render_tree<F>(hierarchy: &Hierarchy, header: &str, line: F) -> String
where
    F: Fn(&HierarchyNode, usize) -> String,
{
    let mut lines = vec![header.custom_color(NORD6).bold().to_string()];
    let roots: Vec<&HierarchyNode> = hierarchy.roots().collect();
    for (i, root) in roots.iter().enumerate() {
        render_node(hierarchy, root, "", i == roots.len() - 1, 0, &line, &mut lines);
    }
    lines.join("\n")
}

fn render_node<F>(
    hierarchy: &Hierarchy,
    node: &HierarchyNode,
    prefix: &str,
    is_last: bool,
    depth: usize,
    line: &F,
    lines: &mut Vec<String>,
) where
    F: Fn(&HierarchyNode, usize) -> String,
{
    let connector = if is_last { "└── " } else { "├── " };
    lines.push(format!("{prefix}{}{}", dim(connector), line(node, depth)));

    let children: Vec<&HierarchyNode> = hierarchy.children_of(&node.key).collect();
    let child_prefix = format!("{prefix}{}", dim(if is_last { "    " } else { "│   " }));
    for (i, child) in children.iter().enumerate() {
        render_node(
            hierarchy,
            child,
            &child_prefix,
            i == children.len() - 1,
            depth + 1,
            line,
            lines,
        );
    }
}

fn node_body(node: &HierarchyNode, depth: usize) -> String {
    format!(
        "{} {}: {}{}",
        color_key(&node.key, depth),
        dim(&format!("[{}]", node.item.work_item_type.short_label())),
        node.item.title.custom_color(NORD4),
        link_suffix(node)
    )
}

/// Render the hierarchy that would be created, without any outcomes
pub fn render_plan_tree(hierarchy: &Hierarchy, header: &str) -> String {
    render_tree(hierarchy, header, |node, depth| {
        format!("{} {}", Mark::Planned.icon(), node_body(node, depth))
    })
}

/// Render the hierarchy annotated with each node's outcome
pub fn render_report_tree(hierarchy: &Hierarchy, report: &BuildReport, header: &str) -> String {
    render_tree(hierarchy, header, |node, depth| match report.get(&node.key) {
        Some(outcome) => format!(
            "{} {}{}",
            Mark::of(outcome).icon(),
            node_body(node, depth),
            outcome_suffix(outcome)
        ),
        None => format!("{} {}", Mark::Planned.icon(), node_body(node, depth)),
    })
}

/// Render the legend explaining status icons
pub fn render_legend() -> String {
    let created = "[✓] Created".custom_color(Mark::Created.color());
    let degraded = "[~] Links missing".custom_color(Mark::Degraded.color());
    let failed = "[✗] Failed".custom_color(Mark::Failed.color());

    format!(
        "{}{}  {}  {}",
        "Legend: ".custom_color(NORD4),
        created,
        degraded,
        failed
    )
}
