mod common;

use common::{shop, SpecTree, SHOP_NARRATIVE};
use specgraph_core::validation::ValidationResult;
use specgraph_core::{NarrativeLinter, NodeType, SchemaValidator};

fn result_for<'a>(results: &'a [ValidationResult], file: &str) -> &'a ValidationResult {
    results
        .iter()
        .find(|r| r.file_path.ends_with(file))
        .unwrap_or_else(|| panic!("no result for {}", file))
}

#[test]
fn test_valid_tree() {
    let tree = shop();
    let report = SchemaValidator::new(&tree.workspace).validate_all();

    assert_eq!(report.total_files, 3);
    assert!(report.is_valid(), "{:?}", report.results);
    assert_eq!(report.warning_count, 0, "{:?}", report.results);
}

#[test]
fn test_unregistered_domain_is_one_error() {
    let tree = shop();
    tree.doc(
        "features/feat_lost.yaml",
        "id: feat_lost\ndomain: dom_missing\nsource_anchor: \"PRD.md#feat_lost\"\nintent: Wander\nrealized_by: [comp_z]\n",
    );
    let validator = SchemaValidator::new(&tree.workspace);
    assert_eq!(validator.registered_domains(), Some(&["dom_a".to_string()][..]));

    let report = validator.validate_all();
    assert_eq!(report.invalid_count, 1);
    let result = result_for(&report.results, "feat_lost.yaml");
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].field, "domain");
    assert!(result.errors[0].message.contains("dom_missing"));
}

#[test]
fn test_domains_registered_by_any_product_document() {
    let tree = SpecTree::new();
    tree.doc("prod_x.yaml", "id: prod_x\nname: X\ndomains:\n  - id: dom_a\n    name: A\n");
    tree.doc(
        "feat_y.yaml",
        "id: feat_y\ndomain: dom_missing\nsource_anchor: \"PRD.md#feat_y\"\nintent: Wander\nrealized_by: [comp_z]\n",
    );
    let validator = SchemaValidator::new(&tree.workspace);
    assert_eq!(validator.registered_domains(), Some(&["dom_a".to_string()][..]));

    let report = validator.validate_all();
    let feat = result_for(&report.results, "feat_y.yaml");
    assert!(!feat.is_valid);
    assert_eq!(feat.errors.len(), 1);
    assert_eq!(feat.errors[0].field, "domain");
    assert!(feat.errors[0].message.contains("dom_missing"));
}

#[test]
fn test_missing_fields_and_prefixes() {
    let tree = SpecTree::new();
    tree.doc("components/comp_bad.yaml", "id: comp_bad\ntype: service\ndesign: just text\n");
    tree.doc("features/wrong.yaml", "id: x_wrong\ntype: feature\n");
    let report = SchemaValidator::new(&tree.workspace).validate_all();

    let comp = result_for(&report.results, "comp_bad.yaml");
    assert_eq!(comp.node_type, Some(NodeType::Component));
    let fields: Vec<&str> = comp.errors.iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, vec!["desc", "file_path", "type", "design"]);

    let feat = result_for(&report.results, "wrong.yaml");
    assert_eq!(feat.node_type, Some(NodeType::Feature));
    assert!(feat.errors.iter().any(|e| e.field == "id" && e.message.contains("feat_")));
    // No product document, so no domain cross-check.
    assert!(feat.errors.iter().all(|e| !e.message.contains("not registered")));
}

#[test]
fn test_unparseable_and_untyped_documents() {
    let tree = SpecTree::new();
    tree.doc("misc/broken.yaml", "id: [unclosed\n");
    tree.doc("misc/list.yaml", "- a\n- b\n");
    tree.doc("misc/mystery.yaml", "id: mystery\n");
    let report = SchemaValidator::new(&tree.workspace).validate_all();

    assert_eq!(report.invalid_count, 3);
    assert!(result_for(&report.results, "broken.yaml").errors[0]
        .message
        .starts_with("YAML parse error"));
    assert_eq!(result_for(&report.results, "list.yaml").errors[0].field, "");
    let mystery = result_for(&report.results, "mystery.yaml");
    assert_eq!(mystery.node_type, None);
    assert_eq!(mystery.errors[0].field, "id");
}

#[test]
fn test_feature_warnings() {
    let tree = shop();
    tree.doc(
        "features/feat_loose.yaml",
        "id: feat_loose\ndomain: dom_a\nsource_anchor: \"docs.md#feat_loose\"\nintent: Wander\n",
    );
    let report = SchemaValidator::new(&tree.workspace).validate_all();

    let result = result_for(&report.results, "feat_loose.yaml");
    assert!(result.is_valid);
    let fields: Vec<&str> = result.warnings.iter().map(|w| w.field.as_str()).collect();
    assert_eq!(fields, vec!["source_anchor", "realized_by"]);
    assert_eq!(report.warning_count, 1);
}

#[test]
fn test_narrative_lint() {
    let tree = shop();
    let missing = NarrativeLinter::new(&tree.workspace).lint();
    assert!(!missing.is_valid());
    assert_eq!(missing.errors[0].message, "PRD.md not found");

    tree.narrative(SHOP_NARRATIVE);
    let report = NarrativeLinter::new(&tree.workspace).lint();
    assert!(report.is_valid(), "{:?}", report.errors);
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);
}
