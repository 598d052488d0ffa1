//! Discovery and parsing of spec documents.
//!
//! A document goes through two stages:
//! - [`RawDocument`]: the file text plus its top-level YAML mapping, kept
//!   untyped so the schema validator can inspect every key;
//! - [`SpecDocument`]: the typed form the sync engine consumes, produced once
//!   the node type is resolved.

mod document;
mod error;

pub use document::{
    ApiExport, ComponentDocument, DesignDocument, DocumentHeader, DomainDocument, FeatureDocument,
    InlineDomain, ProductDocument, SpecDocument, SubstrateDocument,
};
pub use error::DocumentError;

pub(crate) use document::{scalar_string, str_field, str_list};

use ignore::WalkBuilder;
use serde_yaml::{Mapping, Value};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use crate::graph::NodeType;
use crate::workspace::Workspace;

/// SHA-256 hex digest of document text.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// A document read from disk, before its type is resolved.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub path: PathBuf,
    /// Path relative to the project root, `/`-separated.
    pub rel_path: String,
    /// Type implied by the document's location under the spec root.
    pub location_type: Option<NodeType>,
    pub content: String,
    pub content_hash: String,
    pub attributes: Mapping,
}

impl RawDocument {
    /// The `id` field, if present and scalar.
    pub fn id(&self) -> Option<String> {
        self.attributes.get("id").and_then(scalar_string)
    }

    /// The explicit `type` field.
    pub fn explicit_type(&self) -> Option<String> {
        str_field(&self.attributes, "type")
    }

    /// Resolved node type: id prefix, then `type` field, then location.
    pub fn node_type(&self) -> Option<NodeType> {
        let id = self.id().unwrap_or_default();
        NodeType::infer(&id, self.explicit_type().as_deref(), self.location_type)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Resolve the type and build the typed document.
    pub fn to_spec(&self) -> Result<SpecDocument, DocumentError> {
        let id = self
            .id()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| DocumentError::MissingId(self.path.clone()))?;
        let node_type = self.node_type().ok_or_else(|| DocumentError::UnknownType {
            path: self.path.clone(),
            id: id.clone(),
        })?;
        Ok(SpecDocument::from_mapping(node_type, id, &self.attributes))
    }
}

/// Finds and reads the documents of one workspace.
pub struct DocumentLoader<'a> {
    workspace: &'a Workspace,
}

impl<'a> DocumentLoader<'a> {
    pub fn new(workspace: &'a Workspace) -> Self {
        Self { workspace }
    }

    /// All document paths under the spec root, sorted.
    ///
    /// A missing spec root yields an empty list.
    pub fn discover(&self) -> Vec<PathBuf> {
        let spec_dir = self.workspace.spec_dir();
        if !spec_dir.is_dir() {
            return Vec::new();
        }

        let spec = &self.workspace.config().spec;
        let skip_dirs = spec.skip_dirs.clone();

        let walker = WalkBuilder::new(&spec_dir)
            .hidden(false)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .ignore(false)
            .parents(false)
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
                !(is_dir
                    && entry.depth() > 0
                    && skip_dirs
                        .iter()
                        .any(|d| entry.file_name().to_string_lossy() == d.as_str()))
            })
            .build();

        let mut paths = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            let path = entry.path();
            if path.is_file() && self.is_document(path) {
                paths.push(path.to_path_buf());
            }
        }
        paths.sort();
        paths
    }

    fn is_document(&self, path: &Path) -> bool {
        let spec = &self.workspace.config().spec;
        let excluded = path
            .file_name()
            .map(|n| spec.excluded_files.iter().any(|e| n.to_string_lossy() == e.as_str()))
            .unwrap_or(false);
        if excluded {
            return false;
        }
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| spec.document_extensions.iter().any(|e| e == ext))
            .unwrap_or(false)
    }

    /// Read and parse one document.
    pub fn load(&self, path: &Path) -> Result<RawDocument, DocumentError> {
        let content = fs::read_to_string(path).map_err(|e| DocumentError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let value: Value = serde_yaml::from_str(&content).map_err(|e| DocumentError::Yaml {
            path: path.to_path_buf(),
            source: e,
        })?;
        let Value::Mapping(attributes) = value else {
            return Err(DocumentError::NotAMapping(path.to_path_buf()));
        };

        let location_type = path
            .strip_prefix(self.workspace.spec_dir())
            .ok()
            .and_then(|rel| NodeType::from_location(rel, &self.workspace.config().spec.product_file));

        Ok(RawDocument {
            path: path.to_path_buf(),
            rel_path: self.workspace.relative(path),
            location_type,
            content_hash: content_hash(&content),
            content,
            attributes,
        })
    }

    /// Read, parse and type one document.
    pub fn load_spec(&self, path: &Path) -> Result<(RawDocument, SpecDocument), DocumentError> {
        let raw = self.load(path)?;
        let spec = raw.to_spec()?;
        Ok((raw, spec))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_discover_skips_reserved_entries() {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::with_defaults(tmp.path());
        write(tmp.path(), ".specgraph/product.yaml", "id: prod_x\n");
        write(tmp.path(), ".specgraph/features/feat_a.yml", "id: feat_a\n");
        write(tmp.path(), ".specgraph/.runtime/cache.yaml", "id: feat_cache\n");
        write(tmp.path(), ".specgraph/sub_meta_schema.yaml", "id: sub_meta\n");
        write(tmp.path(), ".specgraph/notes.md", "# notes\n");

        let found: Vec<String> = DocumentLoader::new(&ws)
            .discover()
            .iter()
            .map(|p| ws.relative(p))
            .collect();
        assert_eq!(
            found,
            vec![".specgraph/features/feat_a.yml", ".specgraph/product.yaml"]
        );
    }

    #[test]
    fn test_discover_missing_root() {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::with_defaults(tmp.path());
        assert!(DocumentLoader::new(&ws).discover().is_empty());
    }

    #[test]
    fn test_load_errors() {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::with_defaults(tmp.path());
        let loader = DocumentLoader::new(&ws);

        let list = write(tmp.path(), ".specgraph/list.yaml", "- a\n- b\n");
        assert!(matches!(loader.load(&list), Err(DocumentError::NotAMapping(_))));

        let broken = write(tmp.path(), ".specgraph/broken.yaml", "id: [unclosed\n");
        assert!(matches!(loader.load(&broken), Err(DocumentError::Yaml { .. })));

        let no_id = write(tmp.path(), ".specgraph/no_id.yaml", "name: Nameless\n");
        assert!(matches!(loader.load_spec(&no_id), Err(DocumentError::MissingId(_))));

        let unknown = write(tmp.path(), ".specgraph/misc/thing.yaml", "id: thing\n");
        assert!(matches!(
            loader.load_spec(&unknown),
            Err(DocumentError::UnknownType { .. })
        ));
    }

    #[test]
    fn test_type_from_directory() {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::with_defaults(tmp.path());
        let path = write(
            tmp.path(),
            ".specgraph/design/layering.yaml",
            "id: layering\nname: Layering\n",
        );
        let (raw, spec) = DocumentLoader::new(&ws).load_spec(&path).unwrap();
        assert_eq!(raw.location_type, Some(NodeType::Design));
        assert_eq!(spec.node_type(), NodeType::Design);
        assert_eq!(raw.content_hash, content_hash("id: layering\nname: Layering\n"));
    }
}
