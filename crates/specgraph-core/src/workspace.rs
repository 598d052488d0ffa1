//! Resolved paths for one specification project.

use std::path::{Path, PathBuf};

use crate::config::Config;

/// Everything an engine needs to know about where a project lives.
///
/// Built once from a project root and a [`Config`], then passed by reference
/// into every engine constructor.
#[derive(Debug, Clone)]
pub struct Workspace {
    project_root: PathBuf,
    config: Config,
}

impl Workspace {
    /// Creates a workspace rooted at `project_root`.
    pub fn new(project_root: impl Into<PathBuf>, config: Config) -> Self {
        Self {
            project_root: project_root.into(),
            config,
        }
    }

    /// Creates a workspace with default configuration.
    pub fn with_defaults(project_root: impl Into<PathBuf>) -> Self {
        Self::new(project_root, Config::default())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Directory holding the structured documents.
    pub fn spec_dir(&self) -> PathBuf {
        self.project_root.join(&self.config.spec.root_dir)
    }

    /// The product document that registers the domains.
    pub fn product_file(&self) -> PathBuf {
        self.spec_dir().join(&self.config.spec.product_file)
    }

    pub fn narrative_file(&self) -> PathBuf {
        self.project_root.join(&self.config.spec.narrative_file)
    }

    /// File name of the narrative document, used in `source_anchor` references.
    pub fn narrative_name(&self) -> String {
        Path::new(&self.config.spec.narrative_file)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.config.spec.narrative_file.clone())
    }

    pub fn database_file(&self) -> PathBuf {
        self.project_root.join(&self.config.database.path)
    }

    pub fn dashboard_file(&self) -> PathBuf {
        self.project_root.join(&self.config.report.dashboard_file)
    }

    /// Path of `path` relative to the project root, with `/` separators.
    pub fn relative(&self, path: &Path) -> String {
        let rel = path.strip_prefix(&self.project_root).unwrap_or(path);
        rel.components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolved_paths() {
        let ws = Workspace::with_defaults("/proj");
        assert_eq!(ws.spec_dir(), PathBuf::from("/proj/.specgraph"));
        assert_eq!(ws.product_file(), PathBuf::from("/proj/.specgraph/product.yaml"));
        assert_eq!(ws.narrative_file(), PathBuf::from("/proj/PRD.md"));
        assert_eq!(ws.narrative_name(), "PRD.md");
        assert_eq!(
            ws.database_file(),
            PathBuf::from("/proj/.specgraph/.runtime/specgraph.db")
        );
    }

    #[test]
    fn test_relative_path() {
        let ws = Workspace::with_defaults("/proj");
        let rel = ws.relative(Path::new("/proj/.specgraph/features/feat_a.yaml"));
        assert_eq!(rel, ".specgraph/features/feat_a.yaml");
    }
}
