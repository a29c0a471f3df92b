pub mod config;
pub mod enums;
pub mod hierarchy;
pub mod work_item;

// Re-export commonly used types for convenience
pub use config::{PathConfig, PathConfigType, SeederConfig};
pub use enums::{RelationKind, WorkItemType};
pub use hierarchy::{HierarchyNode, NodeState};
pub use work_item::{Fields, Relation, WorkItem};
