//! Typed view over the six kinds of spec document.

use serde::Serialize;
use serde_yaml::{Mapping, Value};

use crate::graph::NodeType;

/// Fields every document kind may carry.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentHeader {
    pub id: String,
    pub name: Option<String>,
    /// `description`, falling back to `desc`.
    pub description: Option<String>,
    pub intent: Option<String>,
    pub source_anchor: Option<String>,
}

impl DocumentHeader {
    pub(crate) fn from_mapping(id: String, map: &Mapping) -> Self {
        Self {
            id,
            name: str_field(map, "name"),
            description: str_field(map, "description").or_else(|| str_field(map, "desc")),
            intent: str_field(map, "intent"),
            source_anchor: str_field(map, "source_anchor"),
        }
    }
}

/// A function a domain exports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiExport {
    pub name: String,
    pub signature: String,
    pub description: Option<String>,
}

/// A domain declared inline in the product document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InlineDomain {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub exports: Vec<ApiExport>,
    /// The inline entry re-serialized, used as the virtual node's raw content.
    pub fragment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductDocument {
    pub header: DocumentHeader,
    pub version: Option<String>,
    pub domains: Vec<InlineDomain>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainDocument {
    pub header: DocumentHeader,
    pub exports: Vec<ApiExport>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureDocument {
    pub header: DocumentHeader,
    pub domain: Option<String>,
    pub depends_on: Vec<String>,
    pub realized_by: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentDocument {
    pub header: DocumentHeader,
    pub file_path: Option<String>,
    pub dependencies: Vec<String>,
    pub design: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DesignDocument {
    pub header: DocumentHeader,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubstrateDocument {
    pub header: DocumentHeader,
}

/// A parsed spec document, tagged by node type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SpecDocument {
    Product(ProductDocument),
    Domain(DomainDocument),
    Feature(FeatureDocument),
    Component(ComponentDocument),
    Design(DesignDocument),
    Substrate(SubstrateDocument),
}

impl SpecDocument {
    /// Build the typed document for an already-resolved type.
    pub fn from_mapping(node_type: NodeType, id: String, map: &Mapping) -> Self {
        let header = DocumentHeader::from_mapping(id, map);
        match node_type {
            NodeType::Product => SpecDocument::Product(ProductDocument {
                header,
                version: str_field(map, "version"),
                domains: inline_domains(map),
            }),
            NodeType::Domain => SpecDocument::Domain(DomainDocument {
                header,
                exports: api_exports(map.get("exports")),
            }),
            NodeType::Feature => SpecDocument::Feature(FeatureDocument {
                header,
                domain: str_field(map, "domain"),
                depends_on: str_list(map, "depends_on"),
                realized_by: str_list(map, "realized_by"),
            }),
            NodeType::Component => SpecDocument::Component(ComponentDocument {
                header,
                file_path: str_field(map, "file_path"),
                dependencies: str_list(map, "dependencies"),
                design: map.get("design").cloned(),
            }),
            NodeType::Design => SpecDocument::Design(DesignDocument { header }),
            NodeType::Substrate => SpecDocument::Substrate(SubstrateDocument { header }),
        }
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            SpecDocument::Product(_) => NodeType::Product,
            SpecDocument::Domain(_) => NodeType::Domain,
            SpecDocument::Feature(_) => NodeType::Feature,
            SpecDocument::Component(_) => NodeType::Component,
            SpecDocument::Design(_) => NodeType::Design,
            SpecDocument::Substrate(_) => NodeType::Substrate,
        }
    }

    pub fn header(&self) -> &DocumentHeader {
        match self {
            SpecDocument::Product(d) => &d.header,
            SpecDocument::Domain(d) => &d.header,
            SpecDocument::Feature(d) => &d.header,
            SpecDocument::Component(d) => &d.header,
            SpecDocument::Design(d) => &d.header,
            SpecDocument::Substrate(d) => &d.header,
        }
    }

    pub fn id(&self) -> &str {
        &self.header().id
    }

    /// Implementation artifact, for components.
    pub fn file_path(&self) -> Option<&str> {
        match self {
            SpecDocument::Component(c) => c.file_path.as_deref(),
            _ => None,
        }
    }
}

/// Scalar value as a string. Numbers and booleans are rendered, `null` is absent.
pub(crate) fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_string(&tagged.value),
        _ => None,
    }
}

pub(crate) fn str_field(map: &Mapping, key: &str) -> Option<String> {
    map.get(key).and_then(scalar_string)
}

/// A list of ids. A lone scalar counts as a one-element list.
pub(crate) fn str_list(map: &Mapping, key: &str) -> Vec<String> {
    match map.get(key) {
        Some(Value::Sequence(items)) => items.iter().filter_map(scalar_string).collect(),
        Some(other) => scalar_string(other).into_iter().collect(),
        None => Vec::new(),
    }
}

fn api_exports(value: Option<&Value>) -> Vec<ApiExport> {
    let Some(Value::Sequence(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(Value::as_mapping)
        .filter_map(|api| {
            let name = str_field(api, "name").filter(|n| !n.is_empty())?;
            Some(ApiExport {
                name,
                signature: str_field(api, "signature").unwrap_or_default(),
                description: str_field(api, "description"),
            })
        })
        .collect()
}

fn inline_domains(map: &Mapping) -> Vec<InlineDomain> {
    let Some(Value::Sequence(items)) = map.get("domains") else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(Value::as_mapping)
        .filter_map(|domain| {
            let id = str_field(domain, "id")?;
            Some(InlineDomain {
                name: str_field(domain, "name"),
                description: str_field(domain, "description"),
                exports: api_exports(domain.get("exports")),
                fragment: serde_yaml::to_string(domain).unwrap_or_default(),
                id,
            })
        })
        .collect()
}
