mod common;

use common::{shop, SpecTree, SHOP_NARRATIVE};
use specgraph_core::consistency::{render_console, SpecStatus};
use specgraph_core::{GraphDb, GraphError, Reconciler, Workspace};
use tempfile::TempDir;

#[test]
fn test_classification() {
    let tree = shop();
    tree.narrative(SHOP_NARRATIVE);
    let report = Reconciler::new(&tree.workspace).check().unwrap();

    let status = |id: &str| report.find(id).map(|n| n.status);
    assert_eq!(status("prod_x"), Some(SpecStatus::Synced));
    assert_eq!(status("dom_a"), Some(SpecStatus::Synced));
    assert_eq!(status("feat_y"), Some(SpecStatus::Synced));
    assert_eq!(status("feat_wishlist"), Some(SpecStatus::PrdOnly));
    assert_eq!(status("comp_z"), Some(SpecStatus::YamlOnly));

    let design: Vec<&str> = report.design.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(design, vec!["dom_a", "prod_x"]);
    assert_eq!(report.features.len(), 2);
    assert_eq!(report.components[0].owning_features, vec!["feat_y"]);
    assert_eq!(report.find("dom_a").unwrap().heading.as_deref(), Some("Domain: Cart"));
}

#[test]
fn test_metrics() {
    let tree = shop();
    tree.narrative(SHOP_NARRATIVE);
    let m = Reconciler::new(&tree.workspace).check().unwrap().metrics;

    assert_eq!((m.schema_valid, m.schema_total, m.schema_pct), (3, 3, 100));
    assert_eq!((m.synced, m.total_nodes, m.sync_pct), (3, 5, 60));
    assert_eq!((m.features_assigned, m.total_features, m.assignment_pct), (1, 2, 50));
    // (100*30 + 60*30 + 50*40) / 100
    assert_eq!(m.overall_pct, 68);
}

#[test]
fn test_end_to_end_assignment() {
    let tree = SpecTree::new();
    tree.doc(
        "prod_x.yaml",
        "id: prod_x\nname: X\ndomains:\n  - id: dom_a\n    name: A\n",
    );
    tree.doc("feat_y.yaml", "id: feat_y\ndomain: dom_a\nrealized_by: [comp_z]\n");
    tree.doc("comp_z.yaml", "id: comp_z\nname: Z\n");
    tree.narrative("# X <!-- id: prod_x -->\n");

    let mut db = GraphDb::open_in_memory().unwrap();
    let sync = tree.sync(&mut db);
    assert_eq!(sync.total_nodes(), 4);
    assert_eq!(sync.edges_created, 3);

    let report = Reconciler::new(&tree.workspace).check().unwrap();
    assert_eq!(report.metrics.assignment_pct, 100);
    assert!(report.find("dom_a").is_some());
}

#[test]
fn test_missing_narrative_is_fatal() {
    let tree = shop();
    let err = Reconciler::new(&tree.workspace).run_check().unwrap_err();
    assert!(matches!(err, GraphError::NarrativeNotFound(_)));
    assert!(!tree.workspace.dashboard_file().exists());
}

#[test]
fn test_missing_spec_root_scores_zero() {
    let tmp = TempDir::new().unwrap();
    let workspace = Workspace::with_defaults(tmp.path());
    std::fs::write(workspace.narrative_file(), SHOP_NARRATIVE).unwrap();
    assert!(!workspace.spec_dir().exists());

    let report = Reconciler::new(&workspace).check().unwrap();
    assert_eq!(report.schema.total_files, 0);
    assert_eq!(report.all_nodes().count(), 4);
    assert!(report.all_nodes().all(|n| n.status == SpecStatus::PrdOnly));

    let m = &report.metrics;
    assert_eq!((m.schema_pct, m.sync_pct, m.assignment_pct), (0, 0, 0));
    assert_eq!(m.total_features, 2);
    assert_eq!(m.overall_pct, 0);
}

#[test]
fn test_dashboard_written() {
    let tree = shop();
    tree.narrative(SHOP_NARRATIVE);
    let report = Reconciler::new(&tree.workspace).run_check().unwrap();

    let md = std::fs::read_to_string(tree.workspace.dashboard_file()).unwrap();
    assert!(md.starts_with("# SpecGraph Product Dashboard"));
    assert!(md.contains("| **Overall** | `[#############-------]` 68% |"));
    assert!(md.contains("| `feat_wishlist` | - | ! PRD Only | X Unassigned |"));
    assert!(md.contains("| `comp_z` | feat_y | X YAML Only |"));
    assert!(md.contains("| `.specgraph/product.yaml` | product | O Valid | - |"));

    let text = render_console(&report);
    assert!(text.contains("Overall:            68%"));
}
