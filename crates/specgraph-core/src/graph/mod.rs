//! Specification graph: a typed, queryable projection of the spec documents.
//!
//! # Components
//!
//! - [`GraphDb`] - SQLite embedded store implementing [`GraphStore`]
//! - [`GraphTx`] - write transaction used by a full rebuild
//! - [`GraphQuery`] - traversal and lookup over any [`GraphStore`]
//!
//! # Storage
//!
//! One SQLite file holding:
//! - **Nodes**: product, domain, feature, component, design, substrate
//! - **Edges**: CONTAINS, OWNS, DEPENDS_ON, REALIZED_BY, ... keyed by
//!   (source, target, relation)
//! - **Domain APIs**: keyed by (domain, api name)
//!
//! # Example
//!
//! ```ignore
//! use specgraph_core::graph::{GraphDb, GraphQuery};
//!
//! let db = GraphDb::open(&workspace.database_file())?;
//! let query = GraphQuery::new(&db);
//! let sub = query.node_with_relations("feat_login", 2)?;
//! ```

mod db;
mod error;
pub mod models;
mod query;

pub use db::{GraphDb, GraphTx};
pub use error::GraphError;
pub use models::{
    DomainApi, Edge, EdgeKey, GraphStats, Node, NodeType, Relation, UnknownKindError,
    VIRTUAL_SOURCE_SUFFIX,
};
pub use query::{ComponentContext, FeatureContext, GraphQuery, Hierarchy, HierarchyNode, Subgraph};

use std::collections::HashSet;

/// Read access to a graph store.
pub trait GraphStore {
    /// Fetch a node by id.
    fn get_node(&self, id: &str) -> Result<Option<Node>, GraphError>;

    /// All nodes, ordered by type then id.
    fn all_nodes(&self) -> Result<Vec<Node>, GraphError>;

    /// Nodes of one type, ordered by id.
    fn nodes_by_type(&self, node_type: NodeType) -> Result<Vec<Node>, GraphError>;

    /// Outgoing edges of `id`, in insertion order.
    fn edges_from(&self, id: &str, relation: Option<Relation>) -> Result<Vec<Edge>, GraphError>;

    /// Incoming edges of `id`, in insertion order.
    fn edges_to(&self, id: &str, relation: Option<Relation>) -> Result<Vec<Edge>, GraphError>;

    /// Every edge, in insertion order.
    fn all_edges(&self) -> Result<Vec<Edge>, GraphError>;

    /// APIs exported by a domain.
    fn domain_apis(&self, domain_id: &str) -> Result<Vec<DomainApi>, GraphError>;

    /// Edges whose source or target is not a node.
    fn dangling_edges(&self) -> Result<Vec<Edge>, GraphError> {
        let ids: HashSet<String> = self.all_nodes()?.into_iter().map(|n| n.id).collect();
        Ok(self
            .all_edges()?
            .into_iter()
            .filter(|e| !ids.contains(&e.source_id) || !ids.contains(&e.target_id))
            .collect())
    }
}
