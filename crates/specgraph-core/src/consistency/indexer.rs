//! Store-independent index of the spec documents.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::graph::{NodeType, VIRTUAL_SOURCE_SUFFIX};
use crate::loader::{str_field, str_list, DocumentLoader};
use crate::workspace::Workspace;

/// What the reconciler needs to know about one declared id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexedNode {
    pub id: String,
    pub node_type: Option<NodeType>,
    pub name: Option<String>,
    /// Declaring document relative to the project root; `#domains` suffix for virtual nodes.
    pub file_path: String,
    pub is_virtual: bool,
    /// Owning domain, for features.
    pub domain: Option<String>,
    /// Realizing components, for features.
    pub realized_by: Vec<String>,
}

/// Indexes every document under the spec root by id.
pub struct SpecIndexer<'a> {
    workspace: &'a Workspace,
}

impl<'a> SpecIndexer<'a> {
    pub fn new(workspace: &'a Workspace) -> Self {
        Self { workspace }
    }

    /// Map of id to indexed node, including virtual domains declared inline
    /// by a product document. A dedicated domain document takes precedence
    /// over an inline declaration of the same id.
    ///
    /// A missing spec root yields an empty index; unreadable documents are
    /// skipped.
    pub fn index_all(&self) -> BTreeMap<String, IndexedNode> {
        let loader = DocumentLoader::new(self.workspace);
        let mut index = BTreeMap::new();
        let mut inline_domains = Vec::new();

        for path in loader.discover() {
            let raw = match loader.load(&path) {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping document while indexing");
                    continue;
                }
            };
            let Some(id) = raw.id().filter(|id| !id.is_empty()) else {
                continue;
            };
            let node_type = raw.node_type();

            if node_type == Some(NodeType::Product) {
                if let Some(serde_yaml::Value::Sequence(domains)) = raw.get("domains") {
                    for domain in domains.iter().filter_map(serde_yaml::Value::as_mapping) {
                        let Some(domain_id) = str_field(domain, "id") else {
                            continue;
                        };
                        inline_domains.push(IndexedNode {
                            name: str_field(domain, "name"),
                            id: domain_id,
                            node_type: Some(NodeType::Domain),
                            file_path: format!("{}{}", raw.rel_path, VIRTUAL_SOURCE_SUFFIX),
                            is_virtual: true,
                            domain: None,
                            realized_by: Vec::new(),
                        });
                    }
                }
            }

            let is_feature = node_type == Some(NodeType::Feature);
            index.insert(
                id.clone(),
                IndexedNode {
                    id,
                    node_type,
                    name: str_field(&raw.attributes, "name"),
                    file_path: raw.rel_path.clone(),
                    is_virtual: false,
                    domain: if is_feature { str_field(&raw.attributes, "domain") } else { None },
                    realized_by: if is_feature {
                        str_list(&raw.attributes, "realized_by")
                    } else {
                        Vec::new()
                    },
                },
            );
        }

        for domain in inline_domains {
            index.entry(domain.id.clone()).or_insert(domain);
        }

        tracing::debug!(count = index.len(), "indexed spec documents");
        index
    }
}

/// Component id to the features whose `realized_by` lists it.
pub fn component_owners(index: &BTreeMap<String, IndexedNode>) -> BTreeMap<String, Vec<String>> {
    let mut owners: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for node in index.values() {
        if node.node_type != Some(NodeType::Feature) {
            continue;
        }
        for comp in &node.realized_by {
            owners.entry(comp.clone()).or_default().push(node.id.clone());
        }
    }
    owners
}
