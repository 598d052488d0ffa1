//! Edge types (relationships) for the specification graph.
//!
//! - **Hierarchy**: CONTAINS (product → domain), OWNS (domain → feature)
//! - **Dependency**: DEPENDS_ON (feature → feature, component → component)
//! - **Realization**: REALIZED_BY (feature → component), BINDS_TO
//! - **API**: EXPORTS, CONSUMES
//! - **Cross-cutting**: REFERENCES

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::node::UnknownKindError;

/// Typed relation between two node ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    /// Product contains domain
    Contains,
    /// Domain owns feature
    Owns,
    /// Feature depends on feature, component depends on component
    DependsOn,
    /// Feature is realized by component
    RealizedBy,
    /// Component binds to a code artifact
    BindsTo,
    /// Domain exports an API
    Exports,
    /// Feature consumes a domain API
    Consumes,
    /// Design/substrate cross-reference
    References,
}

impl Relation {
    pub const ALL: [Relation; 8] = [
        Relation::Contains,
        Relation::Owns,
        Relation::DependsOn,
        Relation::RealizedBy,
        Relation::BindsTo,
        Relation::Exports,
        Relation::Consumes,
        Relation::References,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::Contains => "contains",
            Relation::Owns => "owns",
            Relation::DependsOn => "depends_on",
            Relation::RealizedBy => "realized_by",
            Relation::BindsTo => "binds_to",
            Relation::Exports => "exports",
            Relation::Consumes => "consumes",
            Relation::References => "references",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Relation {
    type Err = UnknownKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Relation::ALL
            .into_iter()
            .find(|r| r.as_str() == lowered)
            .ok_or_else(|| UnknownKindError {
                kind: "relation",
                value: s.to_string(),
            })
    }
}

/// Uniqueness key of an edge.
pub type EdgeKey = (String, String, Relation);

/// A directed, typed relation. The target may not exist as a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source_id: String,
    pub target_id: String,
    pub relation: Relation,
    /// JSON-encoded metadata.
    pub metadata: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Edge {
    pub fn new(source_id: impl Into<String>, target_id: impl Into<String>, relation: Relation) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            relation,
            metadata: None,
            created_at: Utc::now(),
        }
    }

    pub fn key(&self) -> EdgeKey {
        (self.source_id.clone(), self.target_id.clone(), self.relation)
    }

    /// The endpoint opposite `id`, treating the edge as undirected.
    pub fn other_end(&self, id: &str) -> &str {
        if self.source_id == id {
            &self.target_id
        } else {
            &self.source_id
        }
    }
}
