//! Text renderings of a [`ConsistencyReport`].

use std::fmt::Write as _;

use super::report::{ConsistencyReport, NodeStatus, ProgressMetrics};
use crate::config::{DASHBOARD_ISSUES_PER_FILE, PROGRESS_BAR_WIDTH};
use crate::validation::{ValidationIssue, ValidationResult};

/// Text bar: one `#` per 5%, padded with `-`.
pub fn progress_bar(pct: u32) -> String {
    let filled = ((pct / 5) as usize).min(PROGRESS_BAR_WIDTH);
    format!("{}{}", "#".repeat(filled), "-".repeat(PROGRESS_BAR_WIDTH - filled))
}

fn schema_status(result: &ValidationResult) -> (&'static str, &'static str) {
    if !result.is_valid {
        ("X", "Invalid")
    } else if !result.warnings.is_empty() {
        ("!", "Warnings")
    } else {
        ("O", "Valid")
    }
}

fn type_column(result: &ValidationResult) -> &'static str {
    result.node_type.map(|t| t.as_str()).unwrap_or("unknown")
}

fn issue_summary(result: &ValidationResult) -> String {
    let fmt_issue = |tag: &str, issue: &ValidationIssue| format!("[{}] {}: {}", tag, issue.field, issue.message);
    let issues: Vec<String> = result
        .errors
        .iter()
        .take(DASHBOARD_ISSUES_PER_FILE)
        .map(|e| fmt_issue("E", e))
        .chain(
            result
                .warnings
                .iter()
                .take(DASHBOARD_ISSUES_PER_FILE)
                .map(|w| fmt_issue("W", w)),
        )
        .collect();
    if issues.is_empty() {
        "-".to_string()
    } else {
        issues.join("; ")
    }
}

fn join_or_dash(items: &[String]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}

fn status_cell(node: &NodeStatus) -> String {
    format!("{} {}", node.status.marker(), node.status.label())
}

fn assignment_cell(node: &NodeStatus) -> String {
    let marker = if node.is_assigned() { "O" } else { "X" };
    format!("{} {}", marker, node.assignment_label())
}

fn weights_label(m: &ProgressMetrics) -> String {
    format!(
        "Schema({}%) + Spec({}%) + Assignment({}%)",
        m.schema_weight, m.sync_weight, m.assignment_weight
    )
}

/// Markdown dashboard written by `check`.
pub fn render_dashboard(report: &ConsistencyReport) -> String {
    let m = &report.metrics;
    let mut out = String::new();

    let _ = writeln!(out, "# SpecGraph Product Dashboard\n");
    let _ = writeln!(
        out,
        "> **Generated At**: {}\n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S")
    );

    out.push_str("## Progress Overview\n\n");
    out.push_str("| Dimension | Progress | Detail |\n| :--- | :--- | :--- |\n");
    let _ = writeln!(
        out,
        "| **Schema Compliance** | `[{}]` {}% | {}/{} files |",
        progress_bar(m.schema_pct),
        m.schema_pct,
        m.schema_valid,
        m.schema_total
    );
    let _ = writeln!(
        out,
        "| **Spec Sync** | `[{}]` {}% | {}/{} nodes |",
        progress_bar(m.sync_pct),
        m.sync_pct,
        m.synced,
        m.total_nodes
    );
    let _ = writeln!(
        out,
        "| **Feature Assignment** | `[{}]` {}% | {}/{} features |",
        progress_bar(m.assignment_pct),
        m.assignment_pct,
        m.features_assigned,
        m.total_features
    );
    let _ = writeln!(
        out,
        "| **Overall** | `[{}]` {}% | Weighted: {} |",
        progress_bar(m.overall_pct),
        m.overall_pct,
        weights_label(m)
    );

    out.push_str("\n---\n\n## Schema Validation Results\n\n");
    out.push_str("| File | Type | Status | Issues |\n| :--- | :--- | :--- | :--- |\n");
    for result in &report.schema.results {
        let (marker, label) = schema_status(result);
        let _ = writeln!(
            out,
            "| `{}` | {} | {} {} | {} |",
            result.file_path,
            type_column(result),
            marker,
            label,
            issue_summary(result)
        );
    }

    out.push_str("\n---\n\n## System Design (Domain & Design)\n\n");
    out.push_str("| Node ID | Type | Spec Status |\n| :--- | :--- | :--- |\n");
    for node in &report.design {
        let _ = writeln!(out, "| `{}` | {} | {} |", node.id, node.type_label(), status_cell(node));
    }

    out.push_str("\n---\n\n## Features\n\n");
    out.push_str("| Node ID | Domain | Spec Status | Assignment Status |\n| :--- | :--- | :--- | :--- |\n");
    for node in &report.features {
        let _ = writeln!(
            out,
            "| `{}` | {} | {} | {} |",
            node.id,
            node.domain.as_deref().unwrap_or("-"),
            status_cell(node),
            assignment_cell(node)
        );
    }

    out.push_str("\n---\n\n## Components\n\n");
    out.push_str("| Node ID | Parent Feature | Spec Status |\n| :--- | :--- | :--- |\n");
    for node in &report.components {
        let _ = writeln!(
            out,
            "| `{}` | {} | {} |",
            node.id,
            join_or_dash(&node.owning_features),
            status_cell(node)
        );
    }

    out.push_str("\n---\n*Auto-generated by SpecGraph consistency check*\n");
    out
}

fn write_table(out: &mut String, title: &str, headers: &[&str], rows: &[Vec<String>]) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let _ = writeln!(out, "{}", title);
    let header: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(h, w)| format!("{:<width$}", h, width = w))
        .collect();
    let _ = writeln!(out, "  {}", header.join("  ").trim_end());
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(out, "  {}", rule.join("  "));
    if rows.is_empty() {
        out.push_str("  (none)\n");
    }
    for row in rows {
        let cells: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<width$}", c, width = w))
            .collect();
        let _ = writeln!(out, "  {}", cells.join("  ").trim_end());
    }
    out.push('\n');
}

/// Plain-text summary printed by the CLI.
pub fn render_console(report: &ConsistencyReport) -> String {
    let mut out = String::new();
    let schema = &report.schema;

    out.push_str("Schema Validation\n");
    let _ = writeln!(out, "  Total files:   {}", schema.total_files);
    let _ = writeln!(
        out,
        "  Valid:         {} ({}%)",
        schema.valid_count, report.metrics.schema_pct
    );
    let _ = writeln!(out, "  Invalid:       {}", schema.invalid_count);
    let _ = writeln!(out, "  With warnings: {}", schema.warning_count);
    for result in schema.results.iter().filter(|r| !r.is_valid) {
        let _ = writeln!(out, "  x {} ({})", result.file_path, type_column(result));
        for e in &result.errors {
            let _ = writeln!(out, "      - {}: {}", e.field, e.message);
        }
    }
    out.push('\n');

    let design: Vec<Vec<String>> = report
        .design
        .iter()
        .map(|n| vec![n.id.clone(), n.type_label().to_string(), n.status.label().to_string()])
        .collect();
    write_table(
        &mut out,
        "System Design (Domain & Design)",
        &["Node ID", "Type", "Spec Status"],
        &design,
    );

    let features: Vec<Vec<String>> = report
        .features
        .iter()
        .map(|n| {
            vec![
                n.id.clone(),
                n.domain.clone().unwrap_or_else(|| "-".to_string()),
                n.status.label().to_string(),
                n.assignment_label(),
            ]
        })
        .collect();
    write_table(
        &mut out,
        "Features",
        &["Node ID", "Domain", "Spec Status", "Assignment Status"],
        &features,
    );

    let components: Vec<Vec<String>> = report
        .components
        .iter()
        .map(|n| vec![n.id.clone(), join_or_dash(&n.owning_features), n.status.label().to_string()])
        .collect();
    write_table(
        &mut out,
        "Components",
        &["Node ID", "Parent Feature", "Spec Status"],
        &components,
    );

    let m = &report.metrics;
    out.push_str("Progress Summary\n");
    let _ = writeln!(
        out,
        "  Schema Compliance:  {}% ({}/{})",
        m.schema_pct, m.schema_valid, m.schema_total
    );
    let _ = writeln!(out, "  Spec Sync:          {}% ({}/{})", m.sync_pct, m.synced, m.total_nodes);
    let _ = writeln!(
        out,
        "  Feature Assignment: {}% ({}/{})",
        m.assignment_pct, m.features_assigned, m.total_features
    );
    let _ = writeln!(out, "  Overall:            {}% ({})", m.overall_pct, weights_label(m));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consistency::report::SpecStatus;
    use crate::graph::NodeType;
    use crate::validation::{SchemaValidationReport, Severity};
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0), "-".repeat(20));
        assert_eq!(progress_bar(43), format!("{}{}", "#".repeat(8), "-".repeat(12)));
        assert_eq!(progress_bar(100), "#".repeat(20));
    }

    fn sample() -> ConsistencyReport {
        let issue = |field: &str, severity| ValidationIssue {
            field: field.to_string(),
            message: "bad".to_string(),
            severity,
        };
        let invalid = ValidationResult {
            file_path: ".specgraph/features/f.yaml".to_string(),
            node_type: Some(NodeType::Feature),
            is_valid: false,
            errors: vec![
                issue("domain", Severity::Error),
                issue("name", Severity::Error),
                issue("intent", Severity::Error),
            ],
            warnings: vec![issue("realized_by", Severity::Warning)],
        };
        let feature = NodeStatus {
            id: "feat_a".to_string(),
            node_type: Some(NodeType::Feature),
            status: SpecStatus::Synced,
            heading: Some("Feature: A".to_string()),
            domain: None,
            realized_by: vec!["comp_x".to_string()],
            owning_features: Vec::new(),
        };
        ConsistencyReport {
            generated_at: Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
            schema: SchemaValidationReport {
                total_files: 1,
                valid_count: 0,
                invalid_count: 1,
                warning_count: 1,
                results: vec![invalid],
            },
            design: Vec::new(),
            features: vec![feature],
            components: Vec::new(),
            metrics: ProgressMetrics::default(),
        }
    }

    #[test]
    fn test_dashboard_layout() {
        let md = render_dashboard(&sample());
        assert!(md.starts_with("# SpecGraph Product Dashboard"));
        assert!(md.contains("> **Generated At**: 2026-01-02 03:04:05"));
        assert!(md.contains("| `feat_a` | - | O Synced | O Assigned (1) |"));
        assert!(md.contains("X Invalid | [E] domain: bad; [E] name: bad; [W] realized_by: bad |"));
        assert!(!md.contains("[E] intent"));
    }

    #[test]
    fn test_console_lists_invalid_files() {
        let text = render_console(&sample());
        assert!(text.contains("x .specgraph/features/f.yaml (feature)"));
        assert!(text.contains("Assigned (1)"));
        assert!(text.contains("Overall:"));
    }
}
