//! Classification of ids and progress metrics.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use super::anchors::Anchor;
use super::indexer::{component_owners, IndexedNode};
use crate::config::ReportConfig;
use crate::graph::{GraphError, NodeType};
use crate::validation::SchemaValidationReport;

/// Where an id is declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SpecStatus {
    /// In both the narrative and a structured document.
    Synced,
    /// Only anchored in the narrative document.
    PrdOnly,
    /// Only declared by a structured document.
    YamlOnly,
}

impl SpecStatus {
    pub fn label(&self) -> &'static str {
        match self {
            SpecStatus::Synced => "Synced",
            SpecStatus::PrdOnly => "PRD Only",
            SpecStatus::YamlOnly => "YAML Only",
        }
    }

    /// Single-character marker used in the dashboard.
    pub fn marker(&self) -> &'static str {
        match self {
            SpecStatus::Synced => "O",
            SpecStatus::PrdOnly => "!",
            SpecStatus::YamlOnly => "X",
        }
    }
}

/// Display bucket of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Tier {
    /// Product, domain, design, substrate and anything untyped.
    Design,
    Feature,
    Component,
}

impl Tier {
    pub fn of(node_type: Option<NodeType>) -> Tier {
        match node_type {
            Some(NodeType::Feature) => Tier::Feature,
            Some(NodeType::Component) => Tier::Component,
            _ => Tier::Design,
        }
    }
}

/// Reconciliation outcome for one id.
#[derive(Debug, Clone, Serialize)]
pub struct NodeStatus {
    pub id: String,
    pub node_type: Option<NodeType>,
    pub status: SpecStatus,
    /// Enclosing narrative heading, when anchored.
    pub heading: Option<String>,
    /// Owning domain, for features.
    pub domain: Option<String>,
    /// Realizing components, for features.
    pub realized_by: Vec<String>,
    /// Features whose `realized_by` lists this id, for components.
    pub owning_features: Vec<String>,
}

impl NodeStatus {
    pub fn type_label(&self) -> &'static str {
        self.node_type.map(|t| t.display_name()).unwrap_or("Unknown")
    }

    pub fn is_synced(&self) -> bool {
        self.status == SpecStatus::Synced
    }

    pub fn is_assigned(&self) -> bool {
        !self.realized_by.is_empty()
    }

    pub fn assignment_label(&self) -> String {
        if self.is_assigned() {
            format!("Assigned ({})", self.realized_by.len())
        } else {
            "Unassigned".to_string()
        }
    }
}

/// Progress percentages, floored to whole numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProgressMetrics {
    pub schema_valid: usize,
    pub schema_total: usize,
    pub schema_pct: u32,
    pub synced: usize,
    pub total_nodes: usize,
    pub sync_pct: u32,
    pub features_assigned: usize,
    pub total_features: usize,
    pub assignment_pct: u32,
    pub overall_pct: u32,
    pub schema_weight: u32,
    pub sync_weight: u32,
    pub assignment_weight: u32,
}

/// Full reconciliation report.
#[derive(Debug, Clone, Serialize)]
pub struct ConsistencyReport {
    pub generated_at: DateTime<Utc>,
    pub schema: SchemaValidationReport,
    pub design: Vec<NodeStatus>,
    pub features: Vec<NodeStatus>,
    pub components: Vec<NodeStatus>,
    pub metrics: ProgressMetrics,
}

impl ConsistencyReport {
    /// Every classified node, design tier first.
    pub fn all_nodes(&self) -> impl Iterator<Item = &NodeStatus> {
        self.design
            .iter()
            .chain(self.features.iter())
            .chain(self.components.iter())
    }

    pub fn find(&self, id: &str) -> Option<&NodeStatus> {
        self.all_nodes().find(|n| n.id == id)
    }

    pub fn to_json(&self) -> Result<String, GraphError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// `part / total` as a floored percentage; 0 when `total` is 0.
pub fn percentage(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (part * 100 / total) as u32
}

/// Classify the union of anchored and declared ids, sorted by id.
pub fn classify(
    anchors: &BTreeMap<String, Anchor>,
    index: &BTreeMap<String, IndexedNode>,
) -> Vec<NodeStatus> {
    let owners = component_owners(index);
    let ids: BTreeSet<&String> = anchors.keys().chain(index.keys()).collect();

    ids.into_iter()
        .map(|id| {
            let anchor = anchors.get(id);
            let indexed = index.get(id);
            let status = match (anchor.is_some(), indexed.is_some()) {
                (true, true) => SpecStatus::Synced,
                (true, false) => SpecStatus::PrdOnly,
                _ => SpecStatus::YamlOnly,
            };
            let node_type = indexed
                .and_then(|n| n.node_type)
                .or_else(|| NodeType::from_id(id));

            NodeStatus {
                id: id.clone(),
                node_type,
                status,
                heading: anchor.map(|a| a.heading.clone()),
                domain: indexed.and_then(|n| n.domain.clone()),
                realized_by: indexed.map(|n| n.realized_by.clone()).unwrap_or_default(),
                owning_features: owners.get(id).cloned().unwrap_or_default(),
            }
        })
        .collect()
}

/// Compute the progress metrics for classified nodes.
pub fn compute_metrics(
    nodes: &[NodeStatus],
    schema: &SchemaValidationReport,
    weights: &ReportConfig,
) -> ProgressMetrics {
    let synced = nodes.iter().filter(|n| n.is_synced()).count();
    let features: Vec<&NodeStatus> = nodes
        .iter()
        .filter(|n| Tier::of(n.node_type) == Tier::Feature)
        .collect();
    let features_assigned = features.iter().filter(|f| f.is_assigned()).count();

    let schema_pct = percentage(schema.valid_count, schema.total_files);
    let sync_pct = percentage(synced, nodes.len());
    let assignment_pct = percentage(features_assigned, features.len());
    let overall_pct = (schema_pct * weights.schema_weight
        + sync_pct * weights.sync_weight
        + assignment_pct * weights.assignment_weight)
        / 100;

    ProgressMetrics {
        schema_valid: schema.valid_count,
        schema_total: schema.total_files,
        schema_pct,
        synced,
        total_nodes: nodes.len(),
        sync_pct,
        features_assigned,
        total_features: features.len(),
        assignment_pct,
        overall_pct,
        schema_weight: weights.schema_weight,
        sync_weight: weights.sync_weight,
        assignment_weight: weights.assignment_weight,
    }
}

/// Build the report from its inputs.
pub fn build_report(
    anchors: &BTreeMap<String, Anchor>,
    index: &BTreeMap<String, IndexedNode>,
    schema: SchemaValidationReport,
    weights: &ReportConfig,
) -> ConsistencyReport {
    let nodes = classify(anchors, index);
    let metrics = compute_metrics(&nodes, &schema, weights);

    let mut design = Vec::new();
    let mut features = Vec::new();
    let mut components = Vec::new();
    for node in nodes {
        match Tier::of(node.node_type) {
            Tier::Design => design.push(node),
            Tier::Feature => features.push(node),
            Tier::Component => components.push(node),
        }
    }

    ConsistencyReport {
        generated_at: Utc::now(),
        schema,
        design,
        features,
        components,
        metrics,
    }
}
