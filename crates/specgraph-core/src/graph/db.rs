//! SQLite embedded database for the specification graph.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::collections::BTreeMap;
use std::path::Path;

use super::error::GraphError;
use super::models::{DomainApi, Edge, GraphStats, Node, NodeType, Relation};
use super::GraphStore;
use crate::config::DB_SCHEMA_VERSION;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS nodes (
    id            TEXT PRIMARY KEY,
    type          TEXT NOT NULL,
    name          TEXT NOT NULL,
    description   TEXT,
    source_file   TEXT,
    source_anchor TEXT,
    intent        TEXT,
    file_path     TEXT,
    content_hash  TEXT,
    raw_content   TEXT,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_nodes_type ON nodes(type);
CREATE INDEX IF NOT EXISTS idx_nodes_hash ON nodes(content_hash);

CREATE TABLE IF NOT EXISTS edges (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    source_id   TEXT NOT NULL,
    target_id   TEXT NOT NULL,
    relation    TEXT NOT NULL,
    metadata    TEXT,
    created_at  TEXT NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_edges_unique ON edges(source_id, target_id, relation);
CREATE INDEX IF NOT EXISTS idx_edges_source ON edges(source_id);
CREATE INDEX IF NOT EXISTS idx_edges_target ON edges(target_id);

CREATE TABLE IF NOT EXISTS domain_apis (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    domain_id   TEXT NOT NULL,
    api_name    TEXT NOT NULL,
    signature   TEXT NOT NULL,
    description TEXT
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_domain_apis_unique ON domain_apis(domain_id, api_name);

CREATE TABLE IF NOT EXISTS metadata (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

const NODE_COLUMNS: &str = "id, type, name, description, source_file, source_anchor, intent, \
     file_path, content_hash, raw_content, created_at, updated_at";

const EDGE_COLUMNS: &str = "source_id, target_id, relation, metadata, created_at";

const UPSERT_NODE_SQL: &str = "\
INSERT INTO nodes (id, type, name, description, source_file, source_anchor, intent, file_path, content_hash, raw_content, created_at, updated_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
ON CONFLICT(id) DO UPDATE SET
  type = excluded.type,
  name = excluded.name,
  description = excluded.description,
  source_file = excluded.source_file,
  source_anchor = excluded.source_anchor,
  intent = excluded.intent,
  file_path = excluded.file_path,
  content_hash = excluded.content_hash,
  raw_content = excluded.raw_content,
  updated_at = excluded.updated_at";

const UPSERT_EDGE_SQL: &str = "\
INSERT INTO edges (source_id, target_id, relation, metadata, created_at)
VALUES (?1, ?2, ?3, ?4, ?5)
ON CONFLICT(source_id, target_id, relation) DO UPDATE SET
  metadata = excluded.metadata";

const UPSERT_DOMAIN_API_SQL: &str = "\
INSERT INTO domain_apis (domain_id, api_name, signature, description)
VALUES (?1, ?2, ?3, ?4)
ON CONFLICT(domain_id, api_name) DO UPDATE SET
  signature = excluded.signature,
  description = excluded.description";

impl ToSql for NodeType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for NodeType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

impl ToSql for Relation {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Relation {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// Database connection for the specification graph.
pub struct GraphDb {
    conn: Connection,
}

impl std::fmt::Debug for GraphDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphDb").finish_non_exhaustive()
    }
}

impl GraphDb {
    /// Open or create a database at the given path.
    pub fn open(path: &Path) -> Result<Self, GraphError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| GraphError::Io {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize_schema()?;
        tracing::debug!(path = %path.display(), "opened graph database");
        Ok(db)
    }

    /// Open a throwaway in-memory database.
    pub fn open_in_memory() -> Result<Self, GraphError> {
        let db = Self {
            conn: Connection::open_in_memory()?,
        };
        db.initialize_schema()?;
        Ok(db)
    }

    /// Create tables and indexes if they do not exist yet.
    pub fn initialize_schema(&self) -> Result<(), GraphError> {
        self.conn.execute_batch(SCHEMA_SQL)?;
        set_metadata(&self.conn, "schema_version", DB_SCHEMA_VERSION)?;
        Ok(())
    }

    /// Begin a transaction. Dropping the returned handle without calling
    /// [`GraphTx::commit`] rolls every write back.
    pub fn transaction(&mut self) -> Result<GraphTx<'_>, GraphError> {
        Ok(GraphTx {
            tx: self.conn.transaction()?,
        })
    }

    /// Insert or replace a node by id. `created_at` of an existing row is kept.
    pub fn upsert_node(&self, node: &Node) -> Result<(), GraphError> {
        upsert_node(&self.conn, node)
    }

    /// Insert an edge; an existing (source, target, relation) only has its metadata replaced.
    pub fn upsert_edge(&self, edge: &Edge) -> Result<(), GraphError> {
        upsert_edge(&self.conn, edge)
    }

    pub fn upsert_domain_api(&self, api: &DomainApi) -> Result<(), GraphError> {
        upsert_domain_api(&self.conn, api)
    }

    /// Delete a node together with every edge touching it.
    pub fn delete_node(&self, id: &str) -> Result<bool, GraphError> {
        delete_node(&self.conn, id)
    }

    pub fn delete_domain_apis(&self, domain_id: &str) -> Result<usize, GraphError> {
        let removed = self
            .conn
            .execute("DELETE FROM domain_apis WHERE domain_id = ?1", params![domain_id])?;
        Ok(removed)
    }

    pub fn all_domain_apis(&self) -> Result<Vec<DomainApi>, GraphError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT domain_id, api_name, signature, description FROM domain_apis ORDER BY id",
        )?;
        let apis = stmt
            .query_map([], row_to_domain_api)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(apis)
    }

    /// Remove all nodes, edges and domain APIs.
    pub fn clear_all(&self) -> Result<(), GraphError> {
        clear_all(&self.conn)
    }

    pub fn stats(&self) -> Result<GraphStats, GraphError> {
        let count = |sql: &str| -> Result<usize, GraphError> {
            let n: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
            Ok(n as usize)
        };

        let mut stmt = self
            .conn
            .prepare_cached("SELECT type, COUNT(*) FROM nodes GROUP BY type")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, NodeType>(0)?, row.get::<_, i64>(1)? as usize))
        })?;
        let mut nodes_by_type = BTreeMap::new();
        for row in rows {
            let (node_type, n) = row?;
            nodes_by_type.insert(node_type, n);
        }

        Ok(GraphStats {
            nodes: count("SELECT COUNT(*) FROM nodes")?,
            edges: count("SELECT COUNT(*) FROM edges")?,
            domain_apis: count("SELECT COUNT(*) FROM domain_apis")?,
            nodes_by_type,
        })
    }

    pub fn get_metadata(&self, key: &str) -> Result<Option<String>, GraphError> {
        get_metadata(&self.conn, key)
    }

    pub fn set_metadata(&self, key: &str, value: &str) -> Result<(), GraphError> {
        set_metadata(&self.conn, key, value)
    }
}

impl GraphStore for GraphDb {
    fn get_node(&self, id: &str) -> Result<Option<Node>, GraphError> {
        get_node(&self.conn, id)
    }

    fn all_nodes(&self) -> Result<Vec<Node>, GraphError> {
        all_nodes(&self.conn)
    }

    fn nodes_by_type(&self, node_type: NodeType) -> Result<Vec<Node>, GraphError> {
        nodes_by_type(&self.conn, node_type)
    }

    fn edges_from(&self, id: &str, relation: Option<Relation>) -> Result<Vec<Edge>, GraphError> {
        edges_where(&self.conn, "source_id", id, relation)
    }

    fn edges_to(&self, id: &str, relation: Option<Relation>) -> Result<Vec<Edge>, GraphError> {
        edges_where(&self.conn, "target_id", id, relation)
    }

    fn all_edges(&self) -> Result<Vec<Edge>, GraphError> {
        all_edges(&self.conn)
    }

    fn domain_apis(&self, domain_id: &str) -> Result<Vec<DomainApi>, GraphError> {
        domain_apis(&self.conn, domain_id)
    }

    fn dangling_edges(&self) -> Result<Vec<Edge>, GraphError> {
        let sql = format!(
            "SELECT {} FROM edges
             WHERE source_id NOT IN (SELECT id FROM nodes)
                OR target_id NOT IN (SELECT id FROM nodes)
             ORDER BY id",
            EDGE_COLUMNS
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let edges = stmt
            .query_map([], row_to_edge)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(edges)
    }
}

/// A write transaction over the graph.
pub struct GraphTx<'a> {
    tx: Transaction<'a>,
}

impl GraphTx<'_> {
    pub fn upsert_node(&self, node: &Node) -> Result<(), GraphError> {
        upsert_node(&self.tx, node)
    }

    pub fn upsert_edge(&self, edge: &Edge) -> Result<(), GraphError> {
        upsert_edge(&self.tx, edge)
    }

    pub fn upsert_domain_api(&self, api: &DomainApi) -> Result<(), GraphError> {
        upsert_domain_api(&self.tx, api)
    }

    pub fn clear_all(&self) -> Result<(), GraphError> {
        clear_all(&self.tx)
    }

    pub fn set_metadata(&self, key: &str, value: &str) -> Result<(), GraphError> {
        set_metadata(&self.tx, key, value)
    }

    pub fn commit(self) -> Result<(), GraphError> {
        self.tx.commit()?;
        Ok(())
    }
}

impl GraphStore for GraphTx<'_> {
    fn get_node(&self, id: &str) -> Result<Option<Node>, GraphError> {
        get_node(&self.tx, id)
    }

    fn all_nodes(&self) -> Result<Vec<Node>, GraphError> {
        all_nodes(&self.tx)
    }

    fn nodes_by_type(&self, node_type: NodeType) -> Result<Vec<Node>, GraphError> {
        nodes_by_type(&self.tx, node_type)
    }

    fn edges_from(&self, id: &str, relation: Option<Relation>) -> Result<Vec<Edge>, GraphError> {
        edges_where(&self.tx, "source_id", id, relation)
    }

    fn edges_to(&self, id: &str, relation: Option<Relation>) -> Result<Vec<Edge>, GraphError> {
        edges_where(&self.tx, "target_id", id, relation)
    }

    fn all_edges(&self) -> Result<Vec<Edge>, GraphError> {
        all_edges(&self.tx)
    }

    fn domain_apis(&self, domain_id: &str) -> Result<Vec<DomainApi>, GraphError> {
        domain_apis(&self.tx, domain_id)
    }
}

// ---------------------------------------------------------------------------
// Statements shared by the connection and transaction handles
// ---------------------------------------------------------------------------

fn upsert_node(conn: &Connection, node: &Node) -> Result<(), GraphError> {
    let mut stmt = conn.prepare_cached(UPSERT_NODE_SQL)?;
    stmt.execute(params![
        node.id,
        node.node_type,
        node.name,
        node.description,
        node.source_file,
        node.source_anchor,
        node.intent,
        node.file_path,
        node.content_hash,
        node.raw_content,
        node.created_at,
        node.updated_at,
    ])?;
    Ok(())
}

fn upsert_edge(conn: &Connection, edge: &Edge) -> Result<(), GraphError> {
    let mut stmt = conn.prepare_cached(UPSERT_EDGE_SQL)?;
    stmt.execute(params![
        edge.source_id,
        edge.target_id,
        edge.relation,
        edge.metadata,
        edge.created_at,
    ])?;
    Ok(())
}

fn upsert_domain_api(conn: &Connection, api: &DomainApi) -> Result<(), GraphError> {
    let mut stmt = conn.prepare_cached(UPSERT_DOMAIN_API_SQL)?;
    stmt.execute(params![api.domain_id, api.api_name, api.signature, api.description])?;
    Ok(())
}

fn delete_node(conn: &Connection, id: &str) -> Result<bool, GraphError> {
    conn.execute(
        "DELETE FROM edges WHERE source_id = ?1 OR target_id = ?1",
        params![id],
    )?;
    conn.execute("DELETE FROM domain_apis WHERE domain_id = ?1", params![id])?;
    let removed = conn.execute("DELETE FROM nodes WHERE id = ?1", params![id])?;
    Ok(removed > 0)
}

fn clear_all(conn: &Connection) -> Result<(), GraphError> {
    conn.execute_batch("DELETE FROM edges; DELETE FROM domain_apis; DELETE FROM nodes;")?;
    Ok(())
}

fn get_metadata(conn: &Connection, key: &str) -> Result<Option<String>, GraphError> {
    let value = conn
        .query_row(
            "SELECT value FROM metadata WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value)
}

fn set_metadata(conn: &Connection, key: &str, value: &str) -> Result<(), GraphError> {
    conn.execute(
        "INSERT INTO metadata (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )?;
    Ok(())
}

fn get_node(conn: &Connection, id: &str) -> Result<Option<Node>, GraphError> {
    let sql = format!("SELECT {} FROM nodes WHERE id = ?1", NODE_COLUMNS);
    let mut stmt = conn.prepare_cached(&sql)?;
    let node = stmt.query_row(params![id], row_to_node).optional()?;
    Ok(node)
}

fn all_nodes(conn: &Connection) -> Result<Vec<Node>, GraphError> {
    let sql = format!("SELECT {} FROM nodes ORDER BY type, id", NODE_COLUMNS);
    let mut stmt = conn.prepare_cached(&sql)?;
    let nodes = stmt
        .query_map([], row_to_node)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(nodes)
}

fn nodes_by_type(conn: &Connection, node_type: NodeType) -> Result<Vec<Node>, GraphError> {
    let sql = format!("SELECT {} FROM nodes WHERE type = ?1 ORDER BY id", NODE_COLUMNS);
    let mut stmt = conn.prepare_cached(&sql)?;
    let nodes = stmt
        .query_map(params![node_type], row_to_node)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(nodes)
}

fn edges_where(
    conn: &Connection,
    column: &str,
    id: &str,
    relation: Option<Relation>,
) -> Result<Vec<Edge>, GraphError> {
    let sql = format!(
        "SELECT {} FROM edges WHERE {} = ?1 AND (?2 IS NULL OR relation = ?2) ORDER BY id",
        EDGE_COLUMNS, column
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    let edges = stmt
        .query_map(params![id, relation], row_to_edge)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(edges)
}

fn all_edges(conn: &Connection) -> Result<Vec<Edge>, GraphError> {
    let sql = format!("SELECT {} FROM edges ORDER BY id", EDGE_COLUMNS);
    let mut stmt = conn.prepare_cached(&sql)?;
    let edges = stmt
        .query_map([], row_to_edge)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(edges)
}

fn domain_apis(conn: &Connection, domain_id: &str) -> Result<Vec<DomainApi>, GraphError> {
    let mut stmt = conn.prepare_cached(
        "SELECT domain_id, api_name, signature, description FROM domain_apis
         WHERE domain_id = ?1 ORDER BY id",
    )?;
    let apis = stmt
        .query_map(params![domain_id], row_to_domain_api)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(apis)
}

fn row_to_node(row: &Row<'_>) -> rusqlite::Result<Node> {
    Ok(Node {
        id: row.get(0)?,
        node_type: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        source_file: row.get(4)?,
        source_anchor: row.get(5)?,
        intent: row.get(6)?,
        file_path: row.get(7)?,
        content_hash: row.get(8)?,
        raw_content: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

fn row_to_domain_api(row: &Row<'_>) -> rusqlite::Result<DomainApi> {
    Ok(DomainApi {
        domain_id: row.get(0)?,
        api_name: row.get(1)?,
        signature: row.get(2)?,
        description: row.get(3)?,
    })
}

fn row_to_edge(row: &Row<'_>) -> rusqlite::Result<Edge> {
    Ok(Edge {
        source_id: row.get(0)?,
        target_id: row.get(1)?,
        relation: row.get(2)?,
        metadata: row.get(3)?,
        created_at: row.get(4)?,
    })
}
