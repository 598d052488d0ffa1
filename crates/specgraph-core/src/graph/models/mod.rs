//! Data models for the specification graph.

mod edge;
mod node;

pub use edge::{Edge, EdgeKey, Relation};
pub use node::{DomainApi, Node, NodeType, UnknownKindError, VIRTUAL_SOURCE_SUFFIX};

use serde::Serialize;
use std::collections::BTreeMap;

/// Row counts of the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub nodes: usize,
    pub edges: usize,
    pub domain_apis: usize,
    pub nodes_by_type: BTreeMap<NodeType, usize>,
}
