//! Node types for the specification graph.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Suffix appended to the product document path for domains declared inline.
pub const VIRTUAL_SOURCE_SUFFIX: &str = "#domains";

/// A kind string that names no known node type or relation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownKindError {
    pub kind: &'static str,
    pub value: String,
}

/// The six kinds of specification artifact.
///
/// Resolved once when a document is ingested and stored on the [`Node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    /// The product root, registers the domains.
    Product,
    /// A business domain owning features.
    Domain,
    /// A user-facing capability.
    Feature,
    /// An implementation unit realizing features.
    Component,
    /// Cross-cutting design rationale.
    Design,
    /// Platform constraints and substrate.
    Substrate,
}

impl NodeType {
    pub const ALL: [NodeType; 6] = [
        NodeType::Product,
        NodeType::Domain,
        NodeType::Feature,
        NodeType::Component,
        NodeType::Design,
        NodeType::Substrate,
    ];

    /// Stored/serialized name.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Product => "product",
            NodeType::Domain => "domain",
            NodeType::Feature => "feature",
            NodeType::Component => "component",
            NodeType::Design => "design",
            NodeType::Substrate => "substrate",
        }
    }

    /// Returns a human-readable name for the type.
    pub fn display_name(&self) -> &'static str {
        match self {
            NodeType::Product => "Product",
            NodeType::Domain => "Domain",
            NodeType::Feature => "Feature",
            NodeType::Component => "Component",
            NodeType::Design => "Design",
            NodeType::Substrate => "Substrate",
        }
    }

    /// The id prefix every node of this type carries.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            NodeType::Product => "prod_",
            NodeType::Domain => "dom_",
            NodeType::Feature => "feat_",
            NodeType::Component => "comp_",
            NodeType::Design => "des_",
            NodeType::Substrate => "sub_",
        }
    }

    /// Type implied by an id prefix, if any.
    pub fn from_id(id: &str) -> Option<NodeType> {
        Self::ALL.into_iter().find(|t| id.starts_with(t.id_prefix()))
    }

    /// Type implied by where a document sits under the spec root.
    ///
    /// `rel_path` is relative to the spec root. The product document is
    /// recognized by file name, everything else by its nearest known
    /// parent directory.
    pub fn from_location(rel_path: &Path, product_file: &str) -> Option<NodeType> {
        if rel_path
            .file_name()
            .map(|n| n.to_string_lossy() == product_file)
            .unwrap_or(false)
        {
            return Some(NodeType::Product);
        }

        rel_path
            .parent()?
            .components()
            .rev()
            .find_map(|c| match c.as_os_str().to_string_lossy().as_ref() {
                "features" => Some(NodeType::Feature),
                "components" => Some(NodeType::Component),
                "design" | "designs" => Some(NodeType::Design),
                "substrate" | "substrates" => Some(NodeType::Substrate),
                "domains" => Some(NodeType::Domain),
                _ => None,
            })
    }

    /// Resolve a document's type: id prefix first, explicit `type` field
    /// second, directory location third.
    pub fn infer(id: &str, explicit: Option<&str>, location: Option<NodeType>) -> Option<NodeType> {
        NodeType::from_id(id)
            .or_else(|| explicit.and_then(|t| t.parse().ok()))
            .or(location)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = UnknownKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        NodeType::ALL
            .into_iter()
            .find(|t| t.as_str() == lowered)
            .ok_or_else(|| UnknownKindError {
                kind: "node type",
                value: s.to_string(),
            })
    }
}

/// A vertex in the specification graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Globally unique id, e.g. `feat_login`.
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// Display name; defaults to the id.
    pub name: String,
    pub description: Option<String>,
    /// Originating document, relative to the project root. Virtual nodes
    /// point at the declaring document with [`VIRTUAL_SOURCE_SUFFIX`].
    pub source_file: Option<String>,
    /// Reference into the narrative document, e.g. `PRD.md#feat_login`.
    pub source_anchor: Option<String>,
    pub intent: Option<String>,
    /// Implementation artifact described by a component.
    pub file_path: Option<String>,
    /// SHA-256 of the originating document text.
    pub content_hash: Option<String>,
    /// The document's original serialized form.
    pub raw_content: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Node {
    /// Create a node with only id and type set.
    pub fn new(id: impl Into<String>, node_type: NodeType) -> Self {
        let id = id.into();
        let now = Utc::now();
        Self {
            name: id.clone(),
            id,
            node_type,
            description: None,
            source_file: None,
            source_anchor: None,
            intent: None,
            file_path: None,
            content_hash: None,
            raw_content: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this node was declared inline inside another document.
    pub fn is_virtual(&self) -> bool {
        self.source_file
            .as_deref()
            .map(|s| s.ends_with(VIRTUAL_SOURCE_SUFFIX))
            .unwrap_or(false)
    }

    /// Refresh `updated_at`.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// A named, signed function exported by a domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainApi {
    pub domain_id: String,
    pub api_name: String,
    pub signature: String,
    pub description: Option<String>,
}
