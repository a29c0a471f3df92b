use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Work item types the seeder knows how to create
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkItemType {
    Epic,
    Feature,
    BacklogItem,
    Task,
    TestCase,
    Bug,
}

impl WorkItemType {
    /// Type name as it appears in the backend's creation URL (`$Product Backlog Item`).
    pub fn backend_name(self) -> &'static str {
        match self {
            WorkItemType::Epic => "Epic",
            WorkItemType::Feature => "Feature",
            WorkItemType::BacklogItem => "Product Backlog Item",
            WorkItemType::Task => "Task",
            WorkItemType::TestCase => "Test Case",
            WorkItemType::Bug => "Bug",
        }
    }

    /// Short label used in progress output.
    pub fn short_label(self) -> &'static str {
        match self {
            WorkItemType::Epic => "Epic",
            WorkItemType::Feature => "Feature",
            WorkItemType::BacklogItem => "PBI",
            WorkItemType::Task => "Task",
            WorkItemType::TestCase => "Test Case",
            WorkItemType::Bug => "Bug",
        }
    }
}

impl fmt::Display for WorkItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.backend_name())
    }
}

impl FromStr for WorkItemType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "epic" => Ok(WorkItemType::Epic),
            "feature" => Ok(WorkItemType::Feature),
            "product backlog item" | "backlog-item" | "backlog item" | "pbi" => {
                Ok(WorkItemType::BacklogItem)
            }
            "task" => Ok(WorkItemType::Task),
            "test case" | "test-case" => Ok(WorkItemType::TestCase),
            "bug" => Ok(WorkItemType::Bug),
            _ => Err(format!(
                "Unknown work item type: '{s}'. Expected: epic, feature, backlog-item, task, test-case, bug"
            )),
        }
    }
}

/// Kind of link between two work items.
///
/// The kind names the role of the link's *target* relative to the item
/// carrying it: a task holding `ParentOf(42)` says "42 is my parent".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationKind {
    ParentOf,
    ChildOf,
    Related,
    TestedBy,
}

impl RelationKind {
    /// Backend link type reference name.
    pub fn link_type(self) -> &'static str {
        match self {
            RelationKind::ParentOf => "System.LinkTypes.Hierarchy-Reverse",
            RelationKind::ChildOf => "System.LinkTypes.Hierarchy-Forward",
            RelationKind::Related => "System.LinkTypes.Related",
            RelationKind::TestedBy => "Microsoft.VSTS.Common.TestedBy-Reverse",
        }
    }

    pub fn from_link_type(link_type: &str) -> Option<Self> {
        [
            RelationKind::ParentOf,
            RelationKind::ChildOf,
            RelationKind::Related,
            RelationKind::TestedBy,
        ]
        .into_iter()
        .find(|kind| kind.link_type().eq_ignore_ascii_case(link_type))
    }

    /// Whether the link places the item inside its target's subtree.
    pub fn is_hierarchical(self) -> bool {
        matches!(self, RelationKind::ParentOf | RelationKind::ChildOf)
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelationKind::ParentOf => write!(f, "parent-of"),
            RelationKind::ChildOf => write!(f, "child-of"),
            RelationKind::Related => write!(f, "related"),
            RelationKind::TestedBy => write!(f, "tested-by"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_work_item_type_backend_names() {
        assert_eq!(WorkItemType::Epic.backend_name(), "Epic");
        assert_eq!(
            WorkItemType::BacklogItem.backend_name(),
            "Product Backlog Item"
        );
        assert_eq!(WorkItemType::TestCase.backend_name(), "Test Case");
        assert_eq!(WorkItemType::BacklogItem.to_string(), "Product Backlog Item");
    }

    #[test]
    fn test_work_item_type_from_str() {
        assert_eq!("epic".parse::<WorkItemType>(), Ok(WorkItemType::Epic));
        assert_eq!(
            "Product Backlog Item".parse::<WorkItemType>(),
            Ok(WorkItemType::BacklogItem)
        );
        assert_eq!("PBI".parse::<WorkItemType>(), Ok(WorkItemType::BacklogItem));
        assert_eq!(
            "test-case".parse::<WorkItemType>(),
            Ok(WorkItemType::TestCase)
        );
        assert_eq!(" Bug ".parse::<WorkItemType>(), Ok(WorkItemType::Bug));
    }

    #[test]
    fn test_work_item_type_from_str_invalid() {
        let err = "story".parse::<WorkItemType>().unwrap_err();
        assert!(err.contains("story"));
        assert!(err.contains("Expected"));
    }

    #[test]
    fn test_work_item_type_serde_kebab_case() {
        let json = serde_json::to_string(&WorkItemType::BacklogItem).unwrap();
        assert_eq!(json, "\"backlog-item\"");
        let parsed: WorkItemType = serde_json::from_str("\"test-case\"").unwrap();
        assert_eq!(parsed, WorkItemType::TestCase);
    }

    #[test]
    fn test_relation_kind_link_types() {
        assert_eq!(
            RelationKind::ParentOf.link_type(),
            "System.LinkTypes.Hierarchy-Reverse"
        );
        assert_eq!(
            RelationKind::ChildOf.link_type(),
            "System.LinkTypes.Hierarchy-Forward"
        );
        assert_eq!(RelationKind::Related.link_type(), "System.LinkTypes.Related");
        assert_eq!(
            RelationKind::TestedBy.link_type(),
            "Microsoft.VSTS.Common.TestedBy-Reverse"
        );
    }

    #[test]
    fn test_relation_kind_from_link_type() {
        assert_eq!(
            RelationKind::from_link_type("system.linktypes.hierarchy-reverse"),
            Some(RelationKind::ParentOf)
        );
        assert_eq!(
            RelationKind::from_link_type("Microsoft.VSTS.Common.TestedBy-Reverse"),
            Some(RelationKind::TestedBy)
        );
        assert_eq!(RelationKind::from_link_type("ArtifactLink"), None);
    }

    #[test]
    fn test_relation_kind_is_hierarchical() {
        assert!(RelationKind::ParentOf.is_hierarchical());
        assert!(RelationKind::ChildOf.is_hierarchical());
        assert!(!RelationKind::Related.is_hierarchical());
        assert!(!RelationKind::TestedBy.is_hierarchical());
    }
}
