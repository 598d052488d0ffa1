//! Default values for SpecGraph configuration.
//!
//! All hardcoded defaults are centralized here for easy maintenance.

// ============================================================================
// Spec Tree Defaults
// ============================================================================

/// Directory (relative to the project root) holding the structured documents.
pub const DEFAULT_SPEC_ROOT: &str = ".specgraph";

/// Narrative specification document carrying `<!-- id: ... -->` anchors.
pub const DEFAULT_NARRATIVE_FILE: &str = "PRD.md";

/// Product document (relative to the spec root) that registers the domains.
pub const DEFAULT_PRODUCT_FILE: &str = "product.yaml";

/// Extensions recognized as structured documents.
pub const DEFAULT_DOCUMENT_EXTENSIONS: &[&str] = &["yaml", "yml"];

/// Reserved runtime/cache directories never scanned for documents.
pub const DEFAULT_SKIP_DIRS: &[&str] = &[".runtime", "__pycache__"];

/// Schema-definition files that look like documents but are not nodes.
pub const DEFAULT_EXCLUDED_FILES: &[&str] = &["sub_meta_schema.yaml"];

// ============================================================================
// Database Defaults
// ============================================================================

/// Default location of the embedded graph database.
pub const DEFAULT_DB_PATH: &str = ".specgraph/.runtime/specgraph.db";

/// Schema version written into the metadata table.
pub const DB_SCHEMA_VERSION: &str = "1";

// ============================================================================
// Report Defaults
// ============================================================================

/// Generated dashboard document (relative to the project root).
pub const DEFAULT_DASHBOARD_FILE: &str = "PRODUCT_DASHBOARD.md";

/// Weight of schema compliance in the overall score (percent).
pub const DEFAULT_SCHEMA_WEIGHT: u32 = 30;

/// Weight of narrative/structure sync in the overall score (percent).
pub const DEFAULT_SYNC_WEIGHT: u32 = 30;

/// Weight of feature assignment in the overall score (percent).
pub const DEFAULT_ASSIGNMENT_WEIGHT: u32 = 40;

/// Width of the text progress bars in the dashboard.
pub const PROGRESS_BAR_WIDTH: usize = 20;

/// Maximum number of errors (and of warnings) listed per file in the dashboard.
pub const DASHBOARD_ISSUES_PER_FILE: usize = 2;

// ============================================================================
// Narrative Defaults
// ============================================================================

/// Sections every narrative document must contain.
pub const MANDATORY_SECTIONS: &[&str] = &["Product Vision", "Design Principles", "Domain:"];

/// Title recorded for anchors with no enclosing heading.
pub const UNKNOWN_SECTION: &str = "Unknown Section";

// ============================================================================
// Logging Defaults
// ============================================================================

/// Default log filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Project-local config file name.
pub const PROJECT_CONFIG_FILE: &str = "specgraph.toml";
