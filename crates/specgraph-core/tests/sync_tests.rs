mod common;

use common::{shop, SpecTree};
use specgraph_core::graph::EdgeKey;
use specgraph_core::{GraphDb, GraphStore, NodeType, Relation, SyncEngine};

fn edge_keys(db: &GraphDb) -> Vec<EdgeKey> {
    db.all_edges().unwrap().iter().map(|e| e.key()).collect()
}

#[test]
fn test_end_to_end_sync() {
    let tree = shop();
    let mut db = GraphDb::open_in_memory().unwrap();
    let result = tree.sync(&mut db);

    assert!(!result.has_errors(), "{:?}", result.errors);
    assert_eq!(result.added, 4);
    assert_eq!(result.total_nodes(), 4);
    assert_eq!(result.edges_created, 3);
    assert_eq!(result.domain_apis, 1);

    let nodes = db.all_nodes().unwrap();
    let real: Vec<&str> = nodes.iter().filter(|n| !n.is_virtual()).map(|n| n.id.as_str()).collect();
    assert_eq!(real.len(), 3);

    let domain = db.get_node("dom_a").unwrap().unwrap();
    assert_eq!(domain.node_type, NodeType::Domain);
    assert_eq!(domain.name, "Cart");
    assert!(domain.is_virtual());
    assert_eq!(domain.source_file.as_deref(), Some(".specgraph/product.yaml#domains"));

    let mut keys = edge_keys(&db);
    keys.sort();
    let mut expected = vec![
        ("prod_x".to_string(), "dom_a".to_string(), Relation::Contains),
        ("dom_a".to_string(), "feat_y".to_string(), Relation::Owns),
        ("feat_y".to_string(), "comp_z".to_string(), Relation::RealizedBy),
    ];
    expected.sort();
    assert_eq!(keys, expected);

    let apis = db.domain_apis("dom_a").unwrap();
    assert_eq!(apis[0].api_name, "add_item");
    assert!(db.get_metadata("last_sync").unwrap().is_some());
}

#[test]
fn test_sync_is_idempotent() {
    let tree = shop();
    let mut db = GraphDb::open_in_memory().unwrap();
    tree.sync(&mut db);
    let nodes_before = db.all_nodes().unwrap();
    let edges_before = db.all_edges().unwrap();

    let second = tree.sync(&mut db);
    assert_eq!(second.unchanged, 4);
    assert_eq!((second.added, second.updated, second.deleted), (0, 0, 0));
    assert_eq!(db.all_nodes().unwrap(), nodes_before);

    let edges_after = db.all_edges().unwrap();
    assert_eq!(edges_after.len(), edges_before.len());
    for (a, b) in edges_before.iter().zip(&edges_after) {
        assert_eq!(a.key(), b.key());
        assert_eq!(a.created_at, b.created_at);
    }
}

#[test]
fn test_resync_after_rename_touches_only_that_node() {
    let tree = shop();
    let mut db = GraphDb::open_in_memory().unwrap();
    tree.sync(&mut db);
    let before = db.all_nodes().unwrap();
    let edges_before = edge_keys(&db);

    tree.doc(
        "features/feat_y.yaml",
        "id: feat_y\nname: Add to cart\ndescription: Put an item in the cart\nintent: Buy things\n\
         domain: dom_a\nsource_anchor: \"PRD.md#feat_y\"\nrealized_by: [comp_z]\n",
    );
    let result = tree.sync(&mut db);
    assert_eq!((result.updated, result.unchanged), (1, 3));

    for old in &before {
        let new = db.get_node(&old.id).unwrap().unwrap();
        if old.id == "feat_y" {
            assert_eq!(new.name, "Add to cart");
            assert_eq!(new.created_at, old.created_at);
            assert!(new.updated_at >= old.updated_at);
            assert_ne!(new.content_hash, old.content_hash);
        } else {
            assert_eq!(&new, old);
        }
    }
    assert_eq!(edge_keys(&db), edges_before);
}

#[test]
fn test_dedicated_domain_document_wins() {
    let tree = shop();
    tree.doc("domains/dom_a.yaml", "id: dom_a\nname: Cart Domain\n");
    let mut db = GraphDb::open_in_memory().unwrap();
    let result = tree.sync(&mut db);

    assert_eq!(result.total_nodes(), 4);
    let domain = db.get_node("dom_a").unwrap().unwrap();
    assert_eq!(domain.name, "Cart Domain");
    assert!(!domain.is_virtual());
    // Inline exports still register.
    assert_eq!(db.domain_apis("dom_a").unwrap().len(), 1);
}

#[test]
fn test_broken_documents_are_skipped() {
    let tree = shop();
    tree.doc("features/broken.yaml", "id: feat_broken\nname: [unclosed\n");
    tree.doc("notes/readme.yaml", "- just\n- a list\n");
    tree.doc("misc/untyped.yaml", "id: something\n");
    tree.doc(".runtime/cache.yaml", "id: feat_cached\n");
    tree.doc("sub_meta_schema.yaml", "id: sub_schema\ntype: substrate\nname: Schema\n");

    let mut db = GraphDb::open_in_memory().unwrap();
    let result = tree.sync(&mut db);

    assert_eq!(result.errors.len(), 3, "{:?}", result.errors);
    assert_eq!(result.total_nodes(), 4);
    assert!(db.get_node("feat_cached").unwrap().is_none());
    assert!(db.get_node("sub_schema").unwrap().is_none());
}

#[test]
fn test_removed_document_is_deleted() {
    let tree = shop();
    let mut db = GraphDb::open_in_memory().unwrap();
    tree.sync(&mut db);

    std::fs::remove_file(tree.workspace.spec_dir().join("components/comp_z.yaml")).unwrap();
    let result = tree.sync(&mut db);

    assert_eq!(result.deleted, 1);
    assert!(db.get_node("comp_z").unwrap().is_none());
    // The realization edge survives with a dangling target.
    assert_eq!(db.dangling_edges().unwrap().len(), 1);
}

#[test]
fn test_duplicate_ids_reported() {
    let tree = shop();
    // Sorts before features/feat_y.yaml, so the fixture document wins.
    tree.doc(
        "features/copy.yaml",
        "id: feat_y\nname: Copy\ndomain: dom_old\nrealized_by: [comp_old]\n",
    );
    let mut db = GraphDb::open_in_memory().unwrap();
    let result = tree.sync(&mut db);

    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].path, ".specgraph/features/copy.yaml");
    assert!(result.errors[0].message.contains("duplicate id 'feat_y'"));
    assert_eq!(result.total_nodes(), 4);

    let node = db.get_node("feat_y").unwrap().unwrap();
    assert_eq!(node.source_file.as_deref(), Some(".specgraph/features/feat_y.yaml"));

    // Only the surviving document contributes edges.
    let mut keys = edge_keys(&db);
    keys.sort();
    let mut expected = vec![
        ("prod_x".to_string(), "dom_a".to_string(), Relation::Contains),
        ("dom_a".to_string(), "feat_y".to_string(), Relation::Owns),
        ("feat_y".to_string(), "comp_z".to_string(), Relation::RealizedBy),
    ];
    expected.sort();
    assert_eq!(keys, expected);
}

#[test]
fn test_sync_single_file() {
    let tree = SpecTree::new();
    let path = tree.doc("features/feat_solo.yaml", "id: feat_solo\nname: Solo\n");
    let mut db = GraphDb::open_in_memory().unwrap();

    let first = SyncEngine::new(&tree.workspace, &mut db).sync_file(&path).unwrap();
    assert_eq!(first.added, 1);
    let second = SyncEngine::new(&tree.workspace, &mut db)
        .sync_file(std::path::Path::new(".specgraph/features/feat_solo.yaml"))
        .unwrap();
    assert_eq!(second.unchanged, 1);
    assert_eq!(db.get_node("feat_solo").unwrap().unwrap().name, "Solo");
}
