//! The fixed demo dataset: two epics, three features, two backlog items,
//! two tasks, one test case and one bug.

use crate::types::{HierarchyNode, RelationKind, SeederConfig, WorkItem, WorkItemType};

const AREA_PATH: &str = "System.AreaPath";
const ITERATION_PATH: &str = "System.IterationPath";
const PRIORITY: &str = "Microsoft.VSTS.Common.Priority";
const STORY_POINTS: &str = "Microsoft.VSTS.Scheduling.StoryPoints";
const ACTIVITY: &str = "Microsoft.VSTS.Common.Activity";
const SEVERITY: &str = "Microsoft.VSTS.Common.Severity";

/// Build the demo hierarchy for `config`, in declaration (parent-before-child) order.
///
/// With a team configured every node is placed in `<project>\<team>`; with
/// `extended_fields` the backlog items, tasks and bug carry planning fields.
pub fn demo_graph(config: &SeederConfig) -> Vec<HierarchyNode> {
    let extended = config.extended_fields;

    let mut nodes = vec![
        HierarchyNode::root(
            "epic1",
            WorkItem::new(WorkItemType::Epic, "Mobile Application Development Platform")
                .with_description(
                    "Complete mobile application development platform for Azure DevOps integration",
                ),
        ),
        HierarchyNode::root(
            "epic2",
            WorkItem::new(WorkItemType::Epic, "CI/CD Pipeline Implementation").with_description(
                "Implement comprehensive CI/CD pipeline for automated builds and deployments",
            ),
        ),
        HierarchyNode::linked(
            "feature1",
            WorkItem::new(WorkItemType::Feature, "User Authentication & Authorization")
                .with_description(
                    "Implement secure user authentication with PAT and AD authentication support",
                ),
            "epic1",
            RelationKind::ParentOf,
        ),
        HierarchyNode::linked(
            "feature2",
            WorkItem::new(WorkItemType::Feature, "Work Item Management")
                .with_description("Complete work item management system with CRUD operations"),
            "epic1",
            RelationKind::ParentOf,
        ),
        HierarchyNode::linked(
            "feature3",
            WorkItem::new(WorkItemType::Feature, "Build Automation Pipeline")
                .with_description("Automated build pipeline with Android and iOS support"),
            "epic2",
            RelationKind::ParentOf,
        ),
        HierarchyNode::linked(
            "pbi1",
            planning(
                WorkItem::new(WorkItemType::BacklogItem, "Login Screen Implementation")
                    .with_description(
                        "Design and implement login screen with PAT and AD authentication options",
                    ),
                extended,
                &[(PRIORITY, 1), (STORY_POINTS, 5)],
            ),
            "feature1",
            RelationKind::ParentOf,
        ),
        HierarchyNode::linked(
            "pbi2",
            planning(
                WorkItem::new(WorkItemType::BacklogItem, "Work Item List View").with_description(
                    "Implement work item list view with filtering and sorting capabilities",
                ),
                extended,
                &[(PRIORITY, 1), (STORY_POINTS, 8)],
            ),
            "feature2",
            RelationKind::ParentOf,
        ),
        HierarchyNode::linked(
            "task1",
            activity(
                WorkItem::new(WorkItemType::Task, "Design Login UI")
                    .with_description("Create UI mockups and design for login screen"),
                extended,
                "Design",
            ),
            "pbi1",
            RelationKind::ParentOf,
        ),
        HierarchyNode::linked(
            "task2",
            activity(
                WorkItem::new(WorkItemType::Task, "Implement PAT Authentication")
                    .with_description("Implement Personal Access Token authentication flow"),
                extended,
                "Development",
            ),
            "pbi1",
            RelationKind::ParentOf,
        ),
        HierarchyNode::linked(
            "test1",
            WorkItem::new(WorkItemType::TestCase, "Login Screen Test: Valid PAT")
                .with_description("Test login with valid Personal Access Token"),
            "pbi1",
            RelationKind::TestedBy,
        ),
        HierarchyNode::linked(
            "bug1",
            severity(
                WorkItem::new(WorkItemType::Bug, "Login screen crashes on invalid token")
                    .with_description("Application crashes when user enters invalid token format"),
                extended,
            ),
            "pbi1",
            RelationKind::Related,
        ),
    ];

    if let Some(team_path) = config.team_path() {
        for node in &mut nodes {
            place_in_team(&mut node.item, &team_path);
        }
    }

    nodes
}

fn place_in_team(item: &mut WorkItem, team_path: &str) {
    // Area/iteration go first so they precede type-specific fields in the document
    let mut fields = crate::types::Fields::new();
    fields.insert(AREA_PATH.to_string(), team_path.into());
    fields.insert(ITERATION_PATH.to_string(), team_path.into());
    fields.append(&mut item.fields);
    item.fields = fields;
}

fn planning(item: WorkItem, extended: bool, values: &[(&str, u32)]) -> WorkItem {
    if !extended {
        return item;
    }
    values
        .iter()
        .fold(item, |item, (name, value)| item.with_field(*name, *value))
}

fn activity(item: WorkItem, extended: bool, kind: &str) -> WorkItem {
    if extended {
        item.with_field(ACTIVITY, kind)
    } else {
        item
    }
}

fn severity(item: WorkItem, extended: bool) -> WorkItem {
    if extended {
        item.with_field(SEVERITY, "2 - High").with_field(PRIORITY, 1)
    } else {
        item
    }
}
