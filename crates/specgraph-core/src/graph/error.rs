//! Specification graph error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in the specification graph.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Database connection or query error.
    #[error("Database error: {0}")]
    Database(String),

    /// IO error.
    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Report or export serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The structured document tree is missing.
    #[error("Spec root not found: {}. Create it or set spec.root_dir.", .0.display())]
    SpecRootNotFound(PathBuf),

    /// The narrative document is missing.
    #[error("Narrative document not found: {}", .0.display())]
    NarrativeNotFound(PathBuf),

    /// Node not found.
    #[error("Node not found: {0}")]
    NodeNotFound(String),
}

impl From<std::io::Error> for GraphError {
    fn from(err: std::io::Error) -> Self {
        GraphError::Io {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<rusqlite::Error> for GraphError {
    fn from(err: rusqlite::Error) -> Self {
        GraphError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for GraphError {
    fn from(err: serde_json::Error) -> Self {
        GraphError::Serialization(err.to_string())
    }
}
