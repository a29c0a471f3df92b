//! Single-attempt work item creation
//!
//! `EntityCreator` is the seam between the hierarchy builder and the backend:
//! one call, one request, one outcome. Failures are values, not errors, so the
//! builder can record them and move on.

use async_trait::async_trait;
use serde::Serialize;

use crate::types::{Fields, Relation, WorkItem, WorkItemType};

/// Everything needed to create one work item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    #[serde(rename = "type")]
    pub work_item_type: WorkItemType,
    pub title: String,
    pub description: Option<String>,
    pub fields: Fields,
    pub relations: Vec<Relation>,
}

impl CreateRequest {
    pub fn new(work_item_type: WorkItemType, title: impl Into<String>) -> Self {
        Self {
            work_item_type,
            title: title.into(),
            description: None,
            fields: Fields::new(),
            relations: Vec::new(),
        }
    }

    /// Request for `item` carrying the given relations.
    pub fn for_item(item: &WorkItem, relations: Vec<Relation>) -> Self {
        let mut request = Self::new(item.work_item_type, item.title.clone());
        request.description = item.description.clone();
        request.fields = item.fields.clone();
        relations.into_iter().fold(request, Self::with_relation)
    }

    pub fn with_relation(mut self, relation: Relation) -> Self {
        self.relations.push(relation);
        self
    }
}

/// Result of one creation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreationOutcome {
    /// The backend assigned `id`. `missing_relations` lists requested
    /// relations the backend did not echo back.
    Created {
        id: u64,
        missing_relations: Vec<Relation>,
    },
    /// The attempt failed; `reason` is the backend's diagnostic when it sent one.
    Failed(String),
}

impl CreationOutcome {
    pub fn created(id: u64) -> Self {
        CreationOutcome::Created {
            id,
            missing_relations: Vec::new(),
        }
    }

    pub fn identity(&self) -> Option<u64> {
        match self {
            CreationOutcome::Created { id, .. } => Some(*id),
            CreationOutcome::Failed(_) => None,
        }
    }
}

/// Creates a single work item per call. Implementations must not retry.
#[async_trait]
pub trait EntityCreator: Send + Sync {
    async fn create(&self, request: &CreateRequest) -> CreationOutcome;
}
