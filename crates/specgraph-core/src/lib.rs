pub mod config;
pub mod consistency;
pub mod graph;
pub mod loader;
pub mod sync;
pub mod validation;
pub mod workspace;

pub use config::{Config, ConfigError, DatabaseConfig, LoggingConfig, ReportConfig, SpecConfig};
pub use consistency::{ConsistencyReport, Reconciler};
pub use graph::{
    DomainApi, Edge, GraphDb, GraphError, GraphQuery, GraphStats, GraphStore, Node, NodeType, Relation,
};
pub use loader::{DocumentLoader, SpecDocument};
pub use sync::{sync_workspace, SyncEngine, SyncIssue, SyncResult};
pub use validation::{NarrativeLinter, SchemaValidationReport, SchemaValidator, Severity};
pub use workspace::Workspace;
