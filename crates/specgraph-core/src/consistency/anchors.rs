//! Anchor extraction from the narrative document.

use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::UNKNOWN_SECTION;
use crate::graph::GraphError;
use crate::workspace::Workspace;

/// Inline marker declaring a node id: `<!-- id: feat_login -->`.
pub const ANCHOR_PATTERN: &str = r"<!--\s*id:\s*([a-zA-Z0-9_]+)\s*-->";

/// Markdown ATX heading.
pub const HEADING_PATTERN: &str = r"^(#+)\s+(.*)";

/// A node id declared in the narrative document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Anchor {
    pub id: String,
    /// 1-based line of the marker.
    pub line: usize,
    /// Title of the enclosing heading, without the marker.
    pub heading: String,
}

/// Every anchor in `content`, in document order, duplicates included.
///
/// The heading is the one on the marker's own line when there is one,
/// otherwise the nearest heading above it.
pub fn scan_anchors(content: &str) -> Vec<Anchor> {
    let (Ok(anchor_re), Ok(heading_re)) = (Regex::new(ANCHOR_PATTERN), Regex::new(HEADING_PATTERN)) else {
        return Vec::new();
    };

    let mut anchors = Vec::new();
    let mut current_heading: Option<String> = None;

    for (idx, line) in content.lines().enumerate() {
        if let Some(cap) = heading_re.captures(line) {
            let raw = cap.get(2).map(|m| m.as_str()).unwrap_or_default();
            current_heading = Some(anchor_re.replace_all(raw, "").trim().to_string());
        }

        for cap in anchor_re.captures_iter(line) {
            let Some(id) = cap.get(1) else {
                continue;
            };
            anchors.push(Anchor {
                id: id.as_str().to_string(),
                line: idx + 1,
                heading: current_heading
                    .clone()
                    .unwrap_or_else(|| UNKNOWN_SECTION.to_string()),
            });
        }
    }

    anchors
}

/// Anchors keyed by id; the first declaration of an id wins.
pub fn anchor_map(content: &str) -> BTreeMap<String, Anchor> {
    let mut map = BTreeMap::new();
    for anchor in scan_anchors(content) {
        map.entry(anchor.id.clone()).or_insert(anchor);
    }
    map
}

/// Reads anchors from a workspace's narrative document.
pub struct AnchorExtractor<'a> {
    workspace: &'a Workspace,
}

impl<'a> AnchorExtractor<'a> {
    pub fn new(workspace: &'a Workspace) -> Self {
        Self { workspace }
    }

    /// Anchors of the narrative document. A missing document is an error.
    pub fn extract(&self) -> Result<BTreeMap<String, Anchor>, GraphError> {
        let path = self.workspace.narrative_file();
        if !path.is_file() {
            return Err(GraphError::NarrativeNotFound(path));
        }
        let content = std::fs::read_to_string(&path).map_err(|e| GraphError::Io {
            path: path.clone(),
            source: e,
        })?;
        let anchors = anchor_map(&content);
        tracing::debug!(count = anchors.len(), file = %path.display(), "extracted anchors");
        Ok(anchors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NARRATIVE: &str = "\
# Shop <!-- id: prod_shop -->

Intro text <!-- id: des_loose -->

## Domain: Cart <!-- id: dom_cart -->

### Feature: Add item
<!-- id: feat_add_item -->

### Feature: Again <!-- id: feat_add_item -->
";

    #[test]
    fn test_heading_resolution() {
        let anchors = anchor_map(NARRATIVE);
        assert_eq!(anchors.len(), 4);
        assert_eq!(anchors["prod_shop"].heading, "Shop");
        assert_eq!(anchors["des_loose"].heading, "Shop");
        assert_eq!(anchors["dom_cart"].heading, "Domain: Cart");
        assert_eq!(anchors["dom_cart"].line, 5);
    }

    #[test]
    fn test_first_declaration_wins() {
        let anchors = anchor_map(NARRATIVE);
        let feat = &anchors["feat_add_item"];
        assert_eq!(feat.line, 8);
        assert_eq!(feat.heading, "Feature: Add item");
        assert_eq!(scan_anchors(NARRATIVE).len(), 5);
    }

    #[test]
    fn test_no_heading() {
        let anchors = scan_anchors("text <!--id:feat_x-->\n");
        assert_eq!(anchors[0].heading, UNKNOWN_SECTION);
        assert_eq!(anchors[0].id, "feat_x");
    }
}
