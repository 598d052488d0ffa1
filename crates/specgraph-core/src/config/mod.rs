//! Configuration management for SpecGraph.
//!
//! Configuration is loaded from multiple sources with the following priority:
//! 1. Environment variables (highest priority)
//! 2. Project-local `specgraph.toml` file
//! 3. User config `~/.config/specgraph/config.toml`
//! 4. Built-in defaults (lowest priority)

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

mod defaults;

pub use defaults::*;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Structured document tree and narrative document.
    pub spec: SpecConfig,

    /// Embedded graph database.
    pub database: DatabaseConfig,

    /// Consistency report output and scoring.
    pub report: ReportConfig,

    /// Log filter used when `RUST_LOG` is unset.
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration for a project.
    ///
    /// Searches for config in order:
    /// 1. `<project_root>/specgraph.toml` (project local)
    /// 2. `~/.config/specgraph/config.toml` (user config)
    /// 3. Falls back to defaults
    ///
    /// Environment overrides apply in every case.
    pub fn load(project_root: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let local = project_root.as_ref().join(PROJECT_CONFIG_FILE);
        if local.exists() {
            return Self::from_file(&local);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("specgraph").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(root) = std::env::var("SPECGRAPH_SPEC_ROOT") {
            self.spec.root_dir = root;
        }
        if let Ok(file) = std::env::var("SPECGRAPH_NARRATIVE_FILE") {
            self.spec.narrative_file = file;
        }
        if let Ok(path) = std::env::var("SPECGRAPH_DB_PATH") {
            self.database.path = path;
        }
        if let Ok(file) = std::env::var("SPECGRAPH_DASHBOARD_FILE") {
            self.report.dashboard_file = file;
        }
        if let Ok(level) = std::env::var("SPECGRAPH_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let report = &self.report;
        let total = report
            .schema_weight
            .checked_add(report.sync_weight)
            .and_then(|sum| sum.checked_add(report.assignment_weight));
        if total != Some(100) {
            return Err(ConfigError::Invalid(format!(
                "report weights must sum to 100, got {} + {} + {}",
                report.schema_weight, report.sync_weight, report.assignment_weight
            )));
        }
        if self.spec.document_extensions.is_empty() {
            return Err(ConfigError::Invalid(
                "spec.document_extensions must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Create a default config file content as a string.
    pub fn default_config_string() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Structured document tree configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecConfig {
    /// Directory holding the structured documents, relative to the project root.
    pub root_dir: String,

    /// Narrative document, relative to the project root.
    pub narrative_file: String,

    /// Product document, relative to the spec root.
    pub product_file: String,

    /// File extensions (without leading dot) treated as documents.
    pub document_extensions: Vec<String>,

    /// Directory names skipped during the walk.
    pub skip_dirs: Vec<String>,

    /// File names skipped during the walk.
    pub excluded_files: Vec<String>,
}

impl Default for SpecConfig {
    fn default() -> Self {
        Self {
            root_dir: DEFAULT_SPEC_ROOT.to_string(),
            narrative_file: DEFAULT_NARRATIVE_FILE.to_string(),
            product_file: DEFAULT_PRODUCT_FILE.to_string(),
            document_extensions: DEFAULT_DOCUMENT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            skip_dirs: DEFAULT_SKIP_DIRS.iter().map(|s| s.to_string()).collect(),
            excluded_files: DEFAULT_EXCLUDED_FILES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file, relative to the project root.
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_DB_PATH.to_string(),
        }
    }
}

/// Consistency report configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Generated dashboard document, relative to the project root.
    pub dashboard_file: String,

    /// Percent weight of schema compliance in the overall score.
    pub schema_weight: u32,

    /// Percent weight of spec sync in the overall score.
    pub sync_weight: u32,

    /// Percent weight of feature assignment in the overall score.
    pub assignment_weight: u32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            dashboard_file: DEFAULT_DASHBOARD_FILE.to_string(),
            schema_weight: DEFAULT_SCHEMA_WEIGHT,
            sync_weight: DEFAULT_SYNC_WEIGHT,
            assignment_weight: DEFAULT_ASSIGNMENT_WEIGHT,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive, e.g. `info` or `specgraph_core=debug`.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.spec.root_dir, DEFAULT_SPEC_ROOT);
        assert_eq!(config.database.path, DEFAULT_DB_PATH);
        assert_eq!(config.report.assignment_weight, DEFAULT_ASSIGNMENT_WEIGHT);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_to_toml() {
        let toml_str = Config::default_config_string();
        assert!(toml_str.contains("[spec]"));
        assert!(toml_str.contains("[database]"));
        assert!(toml_str.contains("[report]"));
        assert!(toml_str.contains("[logging]"));
    }

    #[test]
    fn test_weights_must_sum_to_hundred() {
        let mut config = Config::default();
        config.report.schema_weight = 50;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_overflowing_weights_rejected() {
        let mut config = Config::default();
        config.report.schema_weight = u32::MAX;
        config.report.sync_weight = 101;
        config.report.assignment_weight = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
