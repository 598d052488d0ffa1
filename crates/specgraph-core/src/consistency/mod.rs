//! Reconciliation of the narrative document against the structured documents.
//!
//! Every id is classified as synced, narrative-only or structure-only, and
//! the results are summarized as progress metrics and a Markdown dashboard.

pub mod anchors;
mod indexer;
mod render;
mod report;

pub use anchors::{Anchor, AnchorExtractor};
pub use indexer::{component_owners, IndexedNode, SpecIndexer};
pub use render::{progress_bar, render_console, render_dashboard};
pub use report::{
    build_report, classify, percentage, ConsistencyReport, NodeStatus, ProgressMetrics, SpecStatus, Tier,
};

use crate::graph::GraphError;
use crate::validation::SchemaValidator;
use crate::workspace::Workspace;

/// Runs the consistency check for a workspace.
pub struct Reconciler<'a> {
    workspace: &'a Workspace,
}

impl<'a> Reconciler<'a> {
    pub fn new(workspace: &'a Workspace) -> Self {
        Self { workspace }
    }

    /// Build the report without writing anything.
    ///
    /// Fails only when the narrative document is missing or unreadable.
    pub fn check(&self) -> Result<ConsistencyReport, GraphError> {
        let anchors = AnchorExtractor::new(self.workspace).extract()?;
        let schema = SchemaValidator::new(self.workspace).validate_all();
        let index = SpecIndexer::new(self.workspace).index_all();
        Ok(build_report(
            &anchors,
            &index,
            schema,
            &self.workspace.config().report,
        ))
    }

    /// Build the report and write the dashboard file.
    pub fn run_check(&self) -> Result<ConsistencyReport, GraphError> {
        let report = self.check()?;
        let path = self.workspace.dashboard_file();
        std::fs::write(&path, render_dashboard(&report)).map_err(|e| GraphError::Io {
            path: path.clone(),
            source: e,
        })?;
        tracing::info!(
            dashboard = %path.display(),
            overall = report.metrics.overall_pct,
            "dashboard updated"
        );
        Ok(report)
    }
}
