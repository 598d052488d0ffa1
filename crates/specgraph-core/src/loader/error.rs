//! Document loading error types.

use std::path::PathBuf;
use thiserror::Error;

/// Why a single document could not be turned into a node.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The file could not be read.
    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid YAML.
    #[error("YAML parse error in {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The top level is not a mapping.
    #[error("Invalid document structure in {}: expected a mapping", .0.display())]
    NotAMapping(PathBuf),

    /// The mapping has no `id`.
    #[error("Missing 'id' field in {}", .0.display())]
    MissingId(PathBuf),

    /// No type could be inferred from id prefix, `type` field or location.
    #[error("Unknown node type for '{id}' in {}", path.display())]
    UnknownType { path: PathBuf, id: String },
}

impl DocumentError {
    /// The document the error refers to.
    pub fn path(&self) -> &PathBuf {
        match self {
            DocumentError::Io { path, .. }
            | DocumentError::Yaml { path, .. }
            | DocumentError::UnknownType { path, .. } => path,
            DocumentError::NotAMapping(path) | DocumentError::MissingId(path) => path,
        }
    }
}
