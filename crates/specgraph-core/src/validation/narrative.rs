//! Format checks for the narrative document: mandatory sections, anchor
//! syntax and naming, heading levels.

use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;

use super::Severity;
use crate::config::MANDATORY_SECTIONS;
use crate::consistency::anchors::{scan_anchors, ANCHOR_PATTERN};
use crate::graph::NodeType;
use crate::workspace::Workspace;

const SNAKE_CASE_PATTERN: &str = r"^[a-z][a-z0-9_]*$";

/// One narrative format problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NarrativeIssue {
    /// 1-based line, when the problem is tied to one.
    pub line: Option<usize>,
    pub message: String,
    pub severity: Severity,
}

/// Outcome of linting the narrative document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NarrativeReport {
    pub errors: Vec<NarrativeIssue>,
    pub warnings: Vec<NarrativeIssue>,
}

impl NarrativeReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, line: Option<usize>, message: String) {
        self.errors.push(NarrativeIssue {
            line,
            message,
            severity: Severity::Error,
        });
    }

    fn warning(&mut self, line: Option<usize>, message: String) {
        self.warnings.push(NarrativeIssue {
            line,
            message,
            severity: Severity::Warning,
        });
    }
}

/// Lints the narrative document of a workspace.
pub struct NarrativeLinter<'a> {
    workspace: &'a Workspace,
}

impl<'a> NarrativeLinter<'a> {
    pub fn new(workspace: &'a Workspace) -> Self {
        Self { workspace }
    }

    /// Lint the narrative document. A missing or unreadable document is
    /// reported as a single error.
    pub fn lint(&self) -> NarrativeReport {
        let path = self.workspace.narrative_file();
        let name = self.workspace.narrative_name();
        if !path.is_file() {
            let mut report = NarrativeReport::default();
            report.error(None, format!("{} not found", name));
            return report;
        }
        match std::fs::read_to_string(&path) {
            Ok(content) => lint_content(&content),
            Err(e) => {
                let mut report = NarrativeReport::default();
                report.error(None, format!("Failed to read {}: {}", name, e));
                report
            }
        }
    }
}

/// Lint narrative text.
pub fn lint_content(content: &str) -> NarrativeReport {
    let mut report = NarrativeReport::default();
    check_mandatory_sections(content, &mut report);
    check_anchor_format(content, &mut report);
    check_anchor_naming(content, &mut report);
    check_heading_levels(content, &mut report);
    report
}

fn check_mandatory_sections(content: &str, report: &mut NarrativeReport) {
    for section in MANDATORY_SECTIONS {
        if !content.contains(section) {
            report.error(None, format!("Missing mandatory section: {}", section));
        }
    }
}

fn check_anchor_format(content: &str, report: &mut NarrativeReport) {
    let Ok(anchor_re) = Regex::new(ANCHOR_PATTERN) else {
        return;
    };

    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let stripped = line.trim();

        // Inline code documenting the syntax is not a declaration.
        if stripped.starts_with('`') || line.contains(": `") {
            continue;
        }
        if !stripped.ends_with("-->") {
            continue;
        }
        if !anchor_re.is_match(line) {
            report.error(
                Some(line_no),
                format!("Invalid anchor format at line {}: {}", line_no, stripped),
            );
            continue;
        }
        let on_heading = stripped.starts_with('#');
        let on_list_item = stripped.starts_with('*') || stripped.starts_with("- ");
        if !on_heading && !on_list_item {
            report.warning(
                Some(line_no),
                format!("Anchor at line {} is not on a heading or list item", line_no),
            );
        }
    }
}

fn check_anchor_naming(content: &str, report: &mut NarrativeReport) {
    let Ok(snake_re) = Regex::new(SNAKE_CASE_PATTERN) else {
        return;
    };
    let prefixes: Vec<&str> = NodeType::ALL.iter().map(|t| t.id_prefix()).collect();
    let mut seen: HashSet<String> = HashSet::new();

    for anchor in scan_anchors(content) {
        if !seen.insert(anchor.id.clone()) {
            report.warning(
                Some(anchor.line),
                format!("Duplicate anchor '{}' at line {}", anchor.id, anchor.line),
            );
            continue;
        }
        if NodeType::from_id(&anchor.id).is_none() {
            report.warning(
                Some(anchor.line),
                format!(
                    "Anchor '{}' does not use a valid prefix (expected: {})",
                    anchor.id,
                    prefixes.join(", ")
                ),
            );
            continue;
        }
        if !snake_re.is_match(&anchor.id) {
            report.warning(
                Some(anchor.line),
                format!("Anchor '{}' is not in snake_case format", anchor.id),
            );
        }
    }
}

fn check_heading_levels(content: &str, report: &mut NarrativeReport) {
    let mut h1_count = 0;

    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let stripped = line.trim();
        if !stripped.starts_with('#') {
            continue;
        }

        if stripped.starts_with("# ") {
            h1_count += 1;
            if h1_count > 1 {
                report.warning(Some(line_no), format!("Multiple H1 headings found at line {}", line_no));
            }
        }
        if stripped.contains("Domain:") && !stripped.starts_with("## ") {
            report.warning(Some(line_no), format!("Domain at line {} should be H2 (##)", line_no));
        }
        if stripped.contains("Feature:") && !stripped.starts_with("### ") {
            report.warning(Some(line_no), format!("Feature at line {} should be H3 (###)", line_no));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD: &str = "\
# Shop <!-- id: prod_shop -->

## Product Vision

## Design Principles

## Domain: Cart <!-- id: dom_cart -->

### Feature: Add item <!-- id: feat_add_item -->

* Checkout flow <!-- id: feat_checkout -->

Use `<!-- id: feat_example -->` to declare anchors.
";

    #[test]
    fn test_clean_document() {
        let report = lint_content(GOOD);
        assert!(report.is_valid(), "{:?}", report.errors);
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    }

    #[test]
    fn test_missing_sections() {
        let report = lint_content("# Title\n");
        assert_eq!(report.errors.len(), MANDATORY_SECTIONS.len());
    }

    #[test]
    fn test_malformed_anchor() {
        let content = format!("{}\n## Domain: Bad <!-- id: dom-bad -->\n", GOOD);
        let report = lint_content(&content);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].message.contains("Invalid anchor format"));
    }

    #[test]
    fn test_trailing_comment_without_anchor() {
        let content = format!("{}
See notes <!-- TODO: expand -->
", GOOD);
        let report = lint_content(&content);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].line, Some(content.lines().count()));
    }

    #[test]
    fn test_naming_and_levels() {
        let content = format!(
            "{}\n# Second title\n#### Feature: Deep <!-- id: misc_thing -->\nplain <!-- id: feat_add_item -->\n",
            GOOD
        );
        let report = lint_content(&content);
        assert!(report.is_valid());
        let messages: Vec<&str> = report.warnings.iter().map(|w| w.message.as_str()).collect();
        assert!(messages.iter().any(|m| m.contains("Multiple H1")));
        assert!(messages.iter().any(|m| m.contains("should be H3")));
        assert!(messages.iter().any(|m| m.contains("valid prefix")));
        assert!(messages.iter().any(|m| m.contains("Duplicate anchor 'feat_add_item'")));
        assert!(messages.iter().any(|m| m.contains("not on a heading")));
    }
}
