//! Per-type schema rules.

use serde_yaml::{Mapping, Value};
use std::path::Path;

use super::{Severity, ValidationIssue};
use crate::graph::NodeType;
use crate::loader::{scalar_string, str_field};

/// Fields every document of a type must declare.
pub fn required_fields(node_type: NodeType) -> &'static [&'static str] {
    match node_type {
        NodeType::Product => &["id", "name", "version", "description", "domains"],
        NodeType::Domain => &["id", "name"],
        NodeType::Feature => &["id", "domain", "source_anchor", "intent"],
        NodeType::Component => &["id", "type", "desc", "file_path", "design"],
        NodeType::Design => &["id", "type", "name", "intent"],
        NodeType::Substrate => &["id", "type", "name"],
    }
}

/// Required value of the explicit `type` field, where one is fixed.
pub fn expected_type_value(node_type: NodeType) -> Option<&'static str> {
    match node_type {
        NodeType::Component => Some("module"),
        NodeType::Design => Some("design"),
        NodeType::Substrate => Some("substrate"),
        _ => None,
    }
}

/// Workspace facts the rules need.
pub struct RuleContext<'a> {
    pub project_root: &'a Path,
    /// File name of the narrative document, the expected `source_anchor` prefix.
    pub narrative_name: &'a str,
    /// Domain ids registered by the product document; `None` when there is
    /// no readable product document.
    pub registered_domains: Option<&'a [String]>,
}

/// Collects issues for one document.
#[derive(Debug, Default)]
pub struct Issues {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl Issues {
    pub fn error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ValidationIssue {
            field: field.into(),
            message: message.into(),
            severity: Severity::Error,
        });
    }

    pub fn warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ValidationIssue {
            field: field.into(),
            message: message.into(),
            severity: Severity::Warning,
        });
    }
}

/// Run every rule for `node_type` over a document mapping.
pub fn check_document(node_type: NodeType, map: &Mapping, ctx: &RuleContext<'_>, issues: &mut Issues) {
    for field in required_fields(node_type) {
        if !map.contains_key(*field) {
            issues.error(*field, format!("Missing required field: {}", field));
        }
    }

    if let Some(id) = map.get("id").and_then(scalar_string) {
        let prefix = node_type.id_prefix();
        if !id.is_empty() && !id.starts_with(prefix) {
            issues.error(
                "id",
                format!(
                    "{} ID must start with '{}', got: {}",
                    node_type.display_name(),
                    prefix,
                    id
                ),
            );
        }
    }

    if let Some(expected) = expected_type_value(node_type) {
        if let Some(actual) = str_field(map, "type") {
            if !actual.is_empty() && actual != expected {
                issues.error(
                    "type",
                    format!(
                        "{} type must be '{}', got: {}",
                        node_type.display_name(),
                        expected,
                        actual
                    ),
                );
            }
        }
    }

    match node_type {
        NodeType::Product => check_product(map, issues),
        NodeType::Feature => check_feature(map, ctx, issues),
        NodeType::Component => check_component(map, ctx, issues),
        NodeType::Domain | NodeType::Design | NodeType::Substrate => {}
    }
}

fn check_product(map: &Mapping, issues: &mut Issues) {
    let Some(domains) = map.get("domains") else {
        return;
    };
    let Value::Sequence(domains) = domains else {
        issues.error("domains", "domains must be a list");
        return;
    };
    for (i, domain) in domains.iter().enumerate() {
        let Value::Mapping(domain) = domain else {
            issues.error(format!("domains[{}]", i), "Each domain must be a mapping");
            continue;
        };
        for field in ["id", "name", "description"] {
            if !domain.contains_key(field) {
                issues.error(
                    format!("domains[{}].{}", i, field),
                    format!("Domain missing required field: {}", field),
                );
            }
        }
    }
}

fn check_feature(map: &Mapping, ctx: &RuleContext<'_>, issues: &mut Issues) {
    if let (Some(domain), Some(registered)) = (str_field(map, "domain"), ctx.registered_domains) {
        if !domain.is_empty() && !registered.iter().any(|d| *d == domain) {
            issues.error(
                "domain",
                format!(
                    "Domain '{}' is not registered in the product document. Valid domains: [{}]",
                    domain,
                    registered.join(", ")
                ),
            );
        }
    }

    if let Some(anchor) = str_field(map, "source_anchor") {
        let prefix = format!("{}#", ctx.narrative_name);
        if !anchor.is_empty() && !anchor.starts_with(&prefix) {
            issues.warning(
                "source_anchor",
                format!("source_anchor should start with '{}', got: {}", prefix, anchor),
            );
        }
    }

    let realized = match map.get("realized_by") {
        Some(Value::Sequence(items)) => !items.is_empty(),
        Some(Value::Null) | None => false,
        Some(other) => scalar_string(other).map_or(false, |s| !s.is_empty()),
    };
    if !realized {
        issues.warning("realized_by", "No components assigned (realized_by is empty)");
    }
}

fn check_component(map: &Mapping, ctx: &RuleContext<'_>, issues: &mut Issues) {
    match map.get("design") {
        Some(Value::Mapping(design)) => {
            if !design.contains_key("api") {
                issues.error("design.api", "design must contain 'api' field");
            }
            if !design.contains_key("logic") {
                issues.error("design.logic", "design must contain 'logic' field");
            }
        }
        Some(_) => issues.error("design", "design must be a mapping"),
        None => {}
    }

    if let Some(code_path) = str_field(map, "file_path") {
        if !code_path.is_empty()
            && !code_path.ends_with('/')
            && !ctx.project_root.join(&code_path).exists()
        {
            issues.warning("file_path", format!("Code file does not exist: {}", code_path));
        }
    }
}
