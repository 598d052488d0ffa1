//! Schema validation of spec documents and linting of the narrative document.
//!
//! Validation reads documents straight from disk and never touches the
//! graph store, so it can run before the first sync.

pub mod narrative;
pub mod rules;

pub use narrative::{NarrativeLinter, NarrativeReport};

use serde::Serialize;
use std::fmt;
use std::path::Path;

use crate::graph::NodeType;
use crate::loader::{str_field, DocumentError, DocumentLoader};
use crate::workspace::Workspace;
use rules::{check_document, Issues, RuleContext};

/// How bad a validation issue is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Makes the document invalid.
    Error,
    /// Reported, but the document stays valid.
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

/// One problem found in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// Offending field, e.g. `domain` or `domains[0].id`. Empty for whole-document problems.
    pub field: String,
    pub message: String,
    pub severity: Severity,
}

/// Outcome of validating one document.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    /// Path relative to the project root.
    pub file_path: String,
    /// `None` when the type could not be inferred.
    pub node_type: Option<NodeType>,
    pub is_valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    fn from_issues(file_path: String, node_type: Option<NodeType>, issues: Issues) -> Self {
        Self {
            file_path,
            node_type,
            is_valid: issues.errors.is_empty(),
            errors: issues.errors,
            warnings: issues.warnings,
        }
    }

    fn failed(file_path: String, field: &str, message: String) -> Self {
        let mut issues = Issues::default();
        issues.error(field, message);
        Self::from_issues(file_path, None, issues)
    }
}

/// Aggregated validation of every document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SchemaValidationReport {
    pub total_files: usize,
    pub valid_count: usize,
    pub invalid_count: usize,
    /// Documents with at least one warning.
    pub warning_count: usize,
    pub results: Vec<ValidationResult>,
}

impl SchemaValidationReport {
    pub fn is_valid(&self) -> bool {
        self.invalid_count == 0
    }

    fn push(&mut self, result: ValidationResult) {
        self.total_files += 1;
        if result.is_valid {
            self.valid_count += 1;
        } else {
            self.invalid_count += 1;
        }
        if !result.warnings.is_empty() {
            self.warning_count += 1;
        }
        self.results.push(result);
    }
}

/// Validates spec documents against the per-type rules in [`rules`].
pub struct SchemaValidator<'a> {
    workspace: &'a Workspace,
    registered_domains: Option<Vec<String>>,
}

impl<'a> SchemaValidator<'a> {
    /// Create a validator, reading the registered domains from the product documents.
    pub fn new(workspace: &'a Workspace) -> Self {
        let registered_domains = Self::load_registered_domains(workspace);
        Self {
            workspace,
            registered_domains,
        }
    }

    /// Domains declared by any product-typed document, or `None` when the
    /// tree has no readable product document.
    fn load_registered_domains(workspace: &Workspace) -> Option<Vec<String>> {
        let loader = DocumentLoader::new(workspace);
        let mut registered: Option<Vec<String>> = None;
        for path in loader.discover() {
            let raw = match loader.load(&path) {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::debug!(error = %e, "unreadable document, not a domain source");
                    continue;
                }
            };
            if raw.node_type() != Some(NodeType::Product) {
                continue;
            }
            let ids = registered.get_or_insert_with(Vec::new);
            if let Some(serde_yaml::Value::Sequence(items)) = raw.get("domains") {
                for id in items
                    .iter()
                    .filter_map(serde_yaml::Value::as_mapping)
                    .filter_map(|d| str_field(d, "id"))
                {
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                }
            }
        }
        if registered.is_none() {
            tracing::debug!("no product document, skipping domain checks");
        }
        registered
    }

    /// Domain ids the product documents register.
    pub fn registered_domains(&self) -> Option<&[String]> {
        self.registered_domains.as_deref()
    }

    /// Validate every document under the spec root.
    ///
    /// A missing spec root yields an empty report.
    pub fn validate_all(&self) -> SchemaValidationReport {
        let mut report = SchemaValidationReport::default();
        for path in DocumentLoader::new(self.workspace).discover() {
            report.push(self.validate_file(&path));
        }
        tracing::info!(
            total = report.total_files,
            invalid = report.invalid_count,
            warnings = report.warning_count,
            "schema validation complete"
        );
        report
    }

    /// Validate a single document.
    pub fn validate_file(&self, path: &Path) -> ValidationResult {
        let rel_path = self.workspace.relative(path);
        let raw = match DocumentLoader::new(self.workspace).load(path) {
            Ok(raw) => raw,
            Err(DocumentError::NotAMapping(_)) => {
                return ValidationResult::failed(
                    rel_path,
                    "",
                    "Document content is not a mapping".to_string(),
                )
            }
            Err(DocumentError::Yaml { source, .. }) => {
                return ValidationResult::failed(rel_path, "", format!("YAML parse error: {}", source))
            }
            Err(e) => return ValidationResult::failed(rel_path, "", format!("Error reading file: {}", e)),
        };

        let Some(node_type) = raw.node_type() else {
            return ValidationResult::failed(
                rel_path,
                "id",
                "Cannot determine node type from ID prefix, type field or file location".to_string(),
            );
        };

        let narrative_name = self.workspace.narrative_name();
        let ctx = RuleContext {
            project_root: self.workspace.project_root(),
            narrative_name: &narrative_name,
            registered_domains: self.registered_domains(),
        };
        let mut issues = Issues::default();
        check_document(node_type, &raw.attributes, &ctx, &mut issues);
        tracing::debug!(
            file = %rel_path,
            errors = issues.errors.len(),
            warnings = issues.warnings.len(),
            "validated"
        );
        ValidationResult::from_issues(rel_path, Some(node_type), issues)
    }
}
