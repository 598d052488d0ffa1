#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use specgraph_core::{GraphDb, SyncEngine, SyncResult, Workspace};
use tempfile::TempDir;

/// A throwaway project directory with a spec tree.
pub struct SpecTree {
    pub dir: TempDir,
    pub workspace: Workspace,
}

impl SpecTree {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let workspace = Workspace::with_defaults(dir.path());
        fs::create_dir_all(workspace.spec_dir()).unwrap();
        Self { dir, workspace }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write a document at `rel` under the spec root.
    pub fn doc(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.workspace.spec_dir().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    pub fn narrative(&self, content: &str) {
        fs::write(self.workspace.narrative_file(), content).unwrap();
    }

    pub fn sync(&self, db: &mut GraphDb) -> SyncResult {
        SyncEngine::new(&self.workspace, db).sync_all().unwrap()
    }
}

/// The three-document shop used across tests: a product declaring one
/// inline domain, a feature in that domain and the component realizing it.
pub fn shop() -> SpecTree {
    let tree = SpecTree::new();
    tree.doc(
        "product.yaml",
        "\
id: prod_x
name: Shop
version: \"0.1.0\"
description: Online shop
domains:
  - id: dom_a
    name: Cart
    description: Shopping cart
    exports:
      - name: add_item
        signature: \"add_item(sku) -> Cart\"
",
    );
    tree.doc(
        "features/feat_y.yaml",
        "\
id: feat_y
name: Add item
description: Put an item in the cart
intent: Buy things
domain: dom_a
source_anchor: \"PRD.md#feat_y\"
realized_by: [comp_z]
",
    );
    tree.doc(
        "components/comp_z.yaml",
        "\
id: comp_z
name: Cart service
desc: Holds cart state
type: module
file_path: src/
design:
  api: add_item
  logic: append to list
",
    );
    tree
}

pub const SHOP_NARRATIVE: &str = "\
# Shop <!-- id: prod_x -->

## Product Vision

## Design Principles

## Domain: Cart <!-- id: dom_a -->

### Feature: Add item <!-- id: feat_y -->

### Feature: Wishlist <!-- id: feat_wishlist -->
";
