//! Full rebuild of the graph store from the spec documents.
//!
//! A sync parses every document first, then clears the store and rebuilds
//! it inside one transaction:
//!
//! 1. one node per document, typed by [`NodeType::infer`];
//! 2. one virtual domain node per inline `domains` entry of a product
//!    document that has no dedicated domain document;
//! 3. edges and domain APIs derived from the typed documents once every
//!    node is known.
//!
//! Timestamps of nodes whose content hash did not change are carried over,
//! so syncing an unchanged tree twice leaves the store identical.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::graph::{
    DomainApi, Edge, EdgeKey, GraphDb, GraphError, GraphStore, Node, NodeType, Relation,
    VIRTUAL_SOURCE_SUFFIX,
};
use crate::loader::{content_hash, DocumentLoader, InlineDomain, RawDocument, SpecDocument};
use crate::workspace::Workspace;

/// A document that could not be synced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncIssue {
    /// Path relative to the project root.
    pub path: String,
    pub message: String,
}

/// Summary of a sync pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncResult {
    /// Ids not present before the sync.
    pub added: usize,
    /// Ids present before whose content changed.
    pub updated: usize,
    pub unchanged: usize,
    /// Ids present before and gone now.
    pub deleted: usize,
    pub edges_created: usize,
    pub domain_apis: usize,
    pub errors: Vec<SyncIssue>,
}

impl SyncResult {
    pub fn total_nodes(&self) -> usize {
        self.added + self.updated + self.unchanged
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Rebuilds the graph store of a workspace.
pub struct SyncEngine<'a> {
    workspace: &'a Workspace,
    db: &'a mut GraphDb,
}

impl<'a> SyncEngine<'a> {
    pub fn new(workspace: &'a Workspace, db: &'a mut GraphDb) -> Self {
        Self { workspace, db }
    }

    /// Clear the store and rebuild it from every document under the spec root.
    ///
    /// Fails before touching the store when the spec root is missing.
    /// Unreadable or untyped documents are reported in
    /// [`SyncResult::errors`] and skipped.
    pub fn sync_all(&mut self) -> Result<SyncResult, GraphError> {
        let spec_dir = self.workspace.spec_dir();
        if !spec_dir.is_dir() {
            return Err(GraphError::SpecRootNotFound(spec_dir));
        }

        tracing::info!(root = %spec_dir.display(), "starting full sync");
        let mut result = SyncResult::default();
        let documents = drop_shadowed(self.load_documents(&mut result), &mut result);
        let now = Utc::now();

        let tx = self.db.transaction()?;
        let previous: HashMap<String, Node> = tx
            .all_nodes()?
            .into_iter()
            .map(|n| (n.id.clone(), n))
            .collect();
        let previous_edges: HashMap<EdgeKey, DateTime<Utc>> = tx
            .all_edges()?
            .into_iter()
            .map(|e| (e.key(), e.created_at))
            .collect();
        tx.clear_all()?;

        let mut nodes = build_nodes(&documents, now);
        for node in nodes.values_mut() {
            match previous.get(&node.id) {
                Some(prev) => {
                    node.created_at = prev.created_at;
                    if prev.content_hash == node.content_hash {
                        node.updated_at = prev.updated_at;
                        result.unchanged += 1;
                    } else {
                        result.updated += 1;
                    }
                }
                None => result.added += 1,
            }
            tx.upsert_node(node)?;
        }
        result.deleted = previous.keys().filter(|id| !nodes.contains_key(*id)).count();

        let (edges, apis) = derive_relations(&documents);
        for mut edge in edges {
            if let Some(created_at) = previous_edges.get(&edge.key()) {
                edge.created_at = *created_at;
            }
            tracing::debug!(
                source = %edge.source_id,
                target = %edge.target_id,
                relation = %edge.relation,
                "edge"
            );
            tx.upsert_edge(&edge)?;
            result.edges_created += 1;
        }
        for api in &apis {
            tx.upsert_domain_api(api)?;
        }
        result.domain_apis = apis.len();

        tx.set_metadata("last_sync", &now.to_rfc3339())?;
        tx.commit()?;

        tracing::info!(
            added = result.added,
            updated = result.updated,
            unchanged = result.unchanged,
            deleted = result.deleted,
            edges = result.edges_created,
            errors = result.errors.len(),
            "sync complete"
        );
        Ok(result)
    }

    /// Upsert the node of a single document without clearing the store or
    /// deriving edges.
    pub fn sync_file(&mut self, path: &Path) -> Result<SyncResult, GraphError> {
        let path: PathBuf = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace.project_root().join(path)
        };

        let mut result = SyncResult::default();
        let (raw, spec) = match DocumentLoader::new(self.workspace).load_spec(&path) {
            Ok(loaded) => loaded,
            Err(e) => {
                tracing::warn!(error = %e, "skipping document");
                result.errors.push(SyncIssue {
                    path: self.workspace.relative(&path),
                    message: e.to_string(),
                });
                return Ok(result);
            }
        };

        let mut node = document_node(&raw, &spec, Utc::now());
        match self.db.get_node(&node.id)? {
            Some(prev) => {
                node.created_at = prev.created_at;
                if prev.content_hash == node.content_hash {
                    node.updated_at = prev.updated_at;
                    result.unchanged = 1;
                } else {
                    result.updated = 1;
                }
            }
            None => result.added = 1,
        }
        self.db.upsert_node(&node)?;
        tracing::debug!(id = %node.id, "synced single document");
        Ok(result)
    }

    fn load_documents(&self, result: &mut SyncResult) -> Vec<(RawDocument, SpecDocument)> {
        let loader = DocumentLoader::new(self.workspace);
        let mut documents = Vec::new();
        for path in loader.discover() {
            match loader.load_spec(&path) {
                Ok(loaded) => documents.push(loaded),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping document");
                    result.errors.push(SyncIssue {
                        path: self.workspace.relative(e.path()),
                        message: e.to_string(),
                    });
                }
            }
        }
        documents
    }
}

/// Keep the last document declaring each id, in discovery order, and report
/// the ones it shadows.
fn drop_shadowed(
    documents: Vec<(RawDocument, SpecDocument)>,
    result: &mut SyncResult,
) -> Vec<(RawDocument, SpecDocument)> {
    let mut winners: HashMap<String, usize> = HashMap::new();
    for (i, (_, spec)) in documents.iter().enumerate() {
        winners.insert(spec.id().to_string(), i);
    }
    let winner_paths: HashMap<String, String> = winners
        .iter()
        .map(|(id, &i)| (id.clone(), documents[i].0.rel_path.clone()))
        .collect();

    let mut kept = Vec::with_capacity(winners.len());
    for (i, (raw, spec)) in documents.into_iter().enumerate() {
        if winners.get(spec.id()) == Some(&i) {
            kept.push((raw, spec));
            continue;
        }
        let winner = winner_paths.get(spec.id()).map(String::as_str).unwrap_or("?");
        tracing::warn!(id = %spec.id(), path = %raw.rel_path, winner = %winner, "duplicate id");
        result.errors.push(SyncIssue {
            path: raw.rel_path.clone(),
            message: format!("duplicate id '{}' (superseded by {})", spec.id(), winner),
        });
    }
    kept
}

/// One node per document plus virtual domains, keyed by id.
///
/// Ids must already be unique across `documents`.
fn build_nodes(documents: &[(RawDocument, SpecDocument)], now: DateTime<Utc>) -> BTreeMap<String, Node> {
    let mut nodes: BTreeMap<String, Node> = documents
        .iter()
        .map(|(raw, spec)| {
            let node = document_node(raw, spec, now);
            (node.id.clone(), node)
        })
        .collect();

    for (raw, spec) in documents {
        let SpecDocument::Product(product) = spec else {
            continue;
        };
        for domain in &product.domains {
            if nodes.contains_key(&domain.id) {
                continue;
            }
            tracing::debug!(id = %domain.id, product = %product.header.id, "virtual domain");
            nodes.insert(domain.id.clone(), virtual_domain_node(&raw.rel_path, domain, now));
        }
    }

    nodes
}

fn document_node(raw: &RawDocument, spec: &SpecDocument, now: DateTime<Utc>) -> Node {
    let header = spec.header();
    let mut node = Node::new(header.id.clone(), spec.node_type());
    if let Some(name) = &header.name {
        node.name = name.clone();
    }
    node.description = header.description.clone();
    node.intent = header.intent.clone();
    node.source_anchor = header.source_anchor.clone();
    node.source_file = Some(raw.rel_path.clone());
    node.file_path = spec.file_path().map(str::to_string);
    node.content_hash = Some(raw.content_hash.clone());
    node.raw_content = Some(raw.content.clone());
    node.created_at = now;
    node.updated_at = now;
    node
}

fn virtual_domain_node(product_path: &str, domain: &InlineDomain, now: DateTime<Utc>) -> Node {
    let mut node = Node::new(domain.id.clone(), NodeType::Domain);
    if let Some(name) = &domain.name {
        node.name = name.clone();
    }
    node.description = domain.description.clone();
    node.source_file = Some(format!("{}{}", product_path, VIRTUAL_SOURCE_SUFFIX));
    node.content_hash = Some(content_hash(&domain.fragment));
    node.raw_content = Some(domain.fragment.clone());
    node.created_at = now;
    node.updated_at = now;
    node
}

/// Edges and domain APIs declared by the documents, deduplicated.
fn derive_relations(documents: &[(RawDocument, SpecDocument)]) -> (Vec<Edge>, Vec<DomainApi>) {
    let mut edges = Vec::new();
    let mut seen: HashSet<EdgeKey> = HashSet::new();
    let mut push = |source: &str, target: &str, relation: Relation| {
        if source.is_empty() || target.is_empty() {
            return;
        }
        let edge = Edge::new(source, target, relation);
        if seen.insert(edge.key()) {
            edges.push(edge);
        }
    };

    let mut apis: BTreeMap<(String, String), DomainApi> = BTreeMap::new();
    let mut export = |domain_id: &str, name: &str, signature: &str, description: Option<&String>| {
        apis.insert(
            (domain_id.to_string(), name.to_string()),
            DomainApi {
                domain_id: domain_id.to_string(),
                api_name: name.to_string(),
                signature: signature.to_string(),
                description: description.cloned(),
            },
        );
    };

    for (_, spec) in documents {
        match spec {
            SpecDocument::Product(product) => {
                for domain in &product.domains {
                    push(&product.header.id, &domain.id, Relation::Contains);
                    for api in &domain.exports {
                        export(&domain.id, &api.name, &api.signature, api.description.as_ref());
                    }
                }
            }
            SpecDocument::Domain(domain) => {
                for api in &domain.exports {
                    export(&domain.header.id, &api.name, &api.signature, api.description.as_ref());
                }
            }
            SpecDocument::Feature(feature) => {
                let id = &feature.header.id;
                if let Some(domain) = &feature.domain {
                    push(domain, id, Relation::Owns);
                }
                for dep in &feature.depends_on {
                    push(id, dep, Relation::DependsOn);
                }
                for comp in &feature.realized_by {
                    push(id, comp, Relation::RealizedBy);
                }
            }
            SpecDocument::Component(component) => {
                for dep in &component.dependencies {
                    push(&component.header.id, dep, Relation::DependsOn);
                }
            }
            SpecDocument::Design(_) | SpecDocument::Substrate(_) => {}
        }
    }

    (edges, apis.into_values().collect())
}

/// Open the workspace's store and run a full sync.
pub fn sync_workspace(workspace: &Workspace) -> Result<SyncResult, GraphError> {
    let mut db = GraphDb::open(&workspace.database_file())?;
    SyncEngine::new(workspace, &mut db).sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::DocumentLoader;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_derive_relations_deduplicates() {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::with_defaults(tmp.path());
        let dir = tmp.path().join(".specgraph/features");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("feat_a.yaml");
        fs::write(
            &path,
            "id: feat_a\ndomain: dom_x\nrealized_by: [comp_b, comp_b, \"\"]\ndepends_on: [feat_c]\n",
        )
        .unwrap();

        let doc = DocumentLoader::new(&ws).load_spec(&path).unwrap();
        let (edges, apis) = derive_relations(&[doc]);
        let triples: Vec<(String, String, Relation)> = edges.iter().map(Edge::key).collect();
        assert_eq!(
            triples,
            vec![
                ("dom_x".to_string(), "feat_a".to_string(), Relation::Owns),
                ("feat_a".to_string(), "feat_c".to_string(), Relation::DependsOn),
                ("feat_a".to_string(), "comp_b".to_string(), Relation::RealizedBy),
            ]
        );
        assert!(apis.is_empty());
    }

    #[test]
    fn test_missing_spec_root_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::with_defaults(tmp.path());
        let mut db = GraphDb::open_in_memory().unwrap();
        db.upsert_node(&Node::new("feat_keep", NodeType::Feature)).unwrap();

        let err = SyncEngine::new(&ws, &mut db).sync_all().unwrap_err();
        assert!(matches!(err, GraphError::SpecRootNotFound(_)));
        assert!(db.get_node("feat_keep").unwrap().is_some());
    }
}
