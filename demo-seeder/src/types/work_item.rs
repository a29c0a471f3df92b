use serde::{Deserialize, Serialize};

use super::enums::{RelationKind, WorkItemType};

/// Free-form backend fields, keyed by reference name (`Microsoft.VSTS.Common.Priority`).
///
/// Insertion order is preserved and is the order the fields are sent in.
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// A work item as the seeder knows it: definition plus the identity the
/// backend assigned, once it has assigned one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItem {
    #[serde(rename = "type")]
    pub work_item_type: WorkItemType,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub fields: Fields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<u64>,
}

impl WorkItem {
    pub fn new(work_item_type: WorkItemType, title: impl Into<String>) -> Self {
        Self {
            work_item_type,
            title: title.into(),
            description: None,
            fields: Fields::new(),
            identity: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

/// Typed link to an already-created work item.
///
/// Holds a concrete identity, so a relation to an item that was never
/// created cannot be expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relation {
    pub kind: RelationKind,
    pub target: u64,
}

impl Relation {
    pub fn new(kind: RelationKind, target: u64) -> Self {
        Self { kind, target }
    }

    pub fn parent_of(target: u64) -> Self {
        Self::new(RelationKind::ParentOf, target)
    }

    pub fn related(target: u64) -> Self {
        Self::new(RelationKind::Related, target)
    }

    pub fn tested_by(target: u64) -> Self {
        Self::new(RelationKind::TestedBy, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_work_item_builder_keeps_field_order() {
        let item = WorkItem::new(WorkItemType::Bug, "Crash")
            .with_description("Crashes on start")
            .with_field("Microsoft.VSTS.Common.Severity", "2 - High")
            .with_field("Microsoft.VSTS.Common.Priority", 1);

        assert_eq!(item.title, "Crash");
        assert_eq!(item.description.as_deref(), Some("Crashes on start"));
        let names: Vec<&str> = item.fields.keys().map(String::as_str).collect();
        assert_eq!(
            names,
            vec![
                "Microsoft.VSTS.Common.Severity",
                "Microsoft.VSTS.Common.Priority"
            ]
        );
        assert!(item.identity.is_none());
    }

    #[test]
    fn test_work_item_serializes_without_empty_parts() {
        let item = WorkItem::new(WorkItemType::Epic, "Platform");
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "epic", "title": "Platform" }));
    }

    #[test]
    fn test_relation_constructors() {
        assert_eq!(Relation::parent_of(7).kind, RelationKind::ParentOf);
        assert_eq!(Relation::related(7).kind, RelationKind::Related);
        assert_eq!(Relation::tested_by(7).kind, RelationKind::TestedBy);
        assert_eq!(Relation::tested_by(7).target, 7);
    }
}
