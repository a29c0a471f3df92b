//! Validated hierarchy and its creation order
//!
//! Kahn's algorithm over the declared parent links. Among nodes that are
//! ready at the same time the one declared first wins, so the demo graph
//! runs epics, features, backlog items, then each backlog item's children.

use std::collections::{BTreeSet, HashMap};

use crate::types::HierarchyNode;

/// Problems with a hierarchy definition, detected before any request is sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("Duplicate node key \"{0}\"")]
    DuplicateKey(String),
    #[error("Node \"{node}\" references unknown parent \"{parent}\"")]
    UnknownParent { node: String, parent: String },
    #[error("Parent links form a cycle through: {}", .0.join(", "))]
    Cycle(Vec<String>),
}

/// A set of nodes together with a parent-before-child processing order.
#[derive(Debug, Clone)]
pub struct Hierarchy {
    nodes: Vec<HierarchyNode>,
    order: Vec<usize>,
}

impl Hierarchy {
    pub fn new(nodes: Vec<HierarchyNode>) -> Result<Self, GraphError> {
        let order = topological_order(&nodes)?;
        Ok(Self { nodes, order })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in processing order.
    pub fn ordered(&self) -> impl Iterator<Item = &HierarchyNode> + '_ {
        self.order.iter().map(move |&index| &self.nodes[index])
    }

    pub fn get(&self, key: &str) -> Option<&HierarchyNode> {
        self.nodes.iter().find(|n| n.key == key)
    }

    /// Nodes without a parent, in declaration order.
    pub fn roots(&self) -> impl Iterator<Item = &HierarchyNode> + '_ {
        self.nodes.iter().filter(|n| n.parent.is_none())
    }

    /// Direct children of `key`, in declaration order.
    pub fn children_of<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a HierarchyNode> + 'a {
        self.nodes
            .iter()
            .filter(move |n| n.parent.as_deref() == Some(key))
    }

    /// Keys of every ancestor of `key`, nearest first.
    pub fn ancestors(&self, key: &str) -> Vec<&str> {
        let mut ancestors = Vec::new();
        let mut current = self.get(key).and_then(|n| n.parent.as_deref());
        while let Some(parent) = current {
            ancestors.push(parent);
            current = self.get(parent).and_then(|n| n.parent.as_deref());
        }
        ancestors
    }
}

/// Indices of `nodes` in an order where every parent precedes its children.
pub fn topological_order(nodes: &[HierarchyNode]) -> Result<Vec<usize>, GraphError> {
    let mut index_of: HashMap<&str, usize> = HashMap::with_capacity(nodes.len());
    for (index, node) in nodes.iter().enumerate() {
        if index_of.insert(node.key.as_str(), index).is_some() {
            return Err(GraphError::DuplicateKey(node.key.clone()));
        }
    }

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    let mut pending_parents = vec![0usize; nodes.len()];
    for (index, node) in nodes.iter().enumerate() {
        if let Some(parent) = &node.parent {
            let parent_index =
                *index_of
                    .get(parent.as_str())
                    .ok_or_else(|| GraphError::UnknownParent {
                        node: node.key.clone(),
                        parent: parent.clone(),
                    })?;
            children[parent_index].push(index);
            pending_parents[index] += 1;
        }
    }

    let mut ready: BTreeSet<usize> = pending_parents
        .iter()
        .enumerate()
        .filter(|(_, count)| **count == 0)
        .map(|(index, _)| index)
        .collect();
    let mut order = Vec::with_capacity(nodes.len());

    while let Some(index) = ready.pop_first() {
        order.push(index);
        for &child in &children[index] {
            pending_parents[child] -= 1;
            if pending_parents[child] == 0 {
                ready.insert(child);
            }
        }
    }

    if order.len() != nodes.len() {
        let stuck = pending_parents
            .iter()
            .enumerate()
            .filter(|(_, count)| **count > 0)
            .map(|(index, _)| nodes[index].key.clone())
            .collect();
        return Err(GraphError::Cycle(stuck));
    }

    Ok(order)
}
