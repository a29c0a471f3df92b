use serde::Serialize;

use super::enums::RelationKind;
use super::work_item::{Relation, WorkItem};

/// A work item definition placed in the demo hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyNode {
    /// Logical key used in the summary (`epic1`, `pbi2`, ...).
    pub key: String,
    pub item: WorkItem,
    /// Key of the logical parent, if the node has one.
    pub parent: Option<String>,
    /// Kind of relation attached to the parent once it exists.
    pub link: RelationKind,
}

impl HierarchyNode {
    /// A node without a parent.
    pub fn root(key: impl Into<String>, item: WorkItem) -> Self {
        Self {
            key: key.into(),
            item,
            parent: None,
            link: RelationKind::ParentOf,
        }
    }

    /// A node linked to `parent` with the given relation kind.
    pub fn linked(
        key: impl Into<String>,
        item: WorkItem,
        parent: impl Into<String>,
        link: RelationKind,
    ) -> Self {
        Self {
            key: key.into(),
            item,
            parent: Some(parent.into()),
            link,
        }
    }

    /// Relation list for this node given its parent's identity, if any.
    ///
    /// A node whose parent is absent or failed gets an empty list.
    pub fn relations_for(&self, parent_identity: Option<u64>) -> Vec<Relation> {
        match (self.parent.as_ref(), parent_identity) {
            (Some(_), Some(id)) => vec![Relation::new(self.link, id)],
            _ => Vec::new(),
        }
    }
}

/// Lifecycle of one node during a build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeState {
    Pending,
    Created(u64),
    Failed(String),
}

impl NodeState {
    pub fn identity(&self) -> Option<u64> {
        match self {
            NodeState::Created(id) => Some(*id),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, NodeState::Pending)
    }

    pub fn is_created(&self) -> bool {
        matches!(self, NodeState::Created(_))
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            NodeState::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}
