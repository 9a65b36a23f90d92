//! SQLite graph store backed by sqlx.
//!
//! Schema (three logical relations):
//! - `uploads(id, name)` - one row per parsed upload
//! - `nodes(id, upload_id, type, label, meta)` keyed by `(id, upload_id)`
//! - `edges(upload_id, source, target, rel)` - append-only, unkeyed

use std::path::PathBuf;
use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;

use super::GraphStore;
use crate::error::StoreError;
use crate::types::{Edge, Node, NodeKind, Relation, ScopeId};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS uploads (
        id   TEXT PRIMARY KEY,
        name TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS nodes (
        id        TEXT NOT NULL,
        upload_id TEXT NOT NULL,
        type      TEXT NOT NULL,
        label     TEXT NOT NULL DEFAULT '',
        meta      TEXT NOT NULL DEFAULT '',
        PRIMARY KEY (id, upload_id)
    )",
    "CREATE TABLE IF NOT EXISTS edges (
        upload_id TEXT NOT NULL,
        source    TEXT NOT NULL,
        target    TEXT NOT NULL,
        rel       TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_edges_upload ON edges(upload_id)",
];

/// Configuration for the SQLite store.
#[derive(Debug, Clone)]
pub struct SqliteStoreConfig {
    /// Database file path.
    pub path: PathBuf,
    /// Maximum pool size. One parse run writes sequentially, so this only
    /// matters when several uploads are parsed concurrently.
    pub max_connections: u32,
}

impl SqliteStoreConfig {
    /// Load configuration from environment variables with defaults.
    pub fn from_env() -> Self {
        Self {
            path: std::env::var("REPOGRAPH_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./repograph.db")),
            max_connections: std::env::var("REPOGRAPH_DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
        }
    }
}

impl Default for SqliteStoreConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// SQLite graph store.
pub struct SqliteGraphStore {
    pool: SqlitePool,
}

impl SqliteGraphStore {
    /// Open (creating if missing) a database file and ensure the schema.
    pub async fn new(config: SqliteStoreConfig) -> Result<Self, StoreError> {
        tracing::info!(
            path = %config.path.display(),
            max_connections = config.max_connections,
            "Opening SQLite graph store"
        );

        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Open an in-memory database. Pool size is pinned to one connection
    /// because each SQLite memory connection is its own database.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    fn encode_meta(node: &Node) -> Result<String, StoreError> {
        match &node.meta {
            Some(value) => Ok(serde_json::to_string(value)?),
            None => Ok(String::new()),
        }
    }

    fn decode_node(scope: &ScopeId, row: &sqlx::sqlite::SqliteRow) -> Result<Node, StoreError> {
        let id: String = row.try_get("id")?;
        let kind: String = row.try_get("type")?;
        let label: String = row.try_get("label")?;
        let meta: String = row.try_get("meta")?;

        let kind = NodeKind::from_str(&kind)
            .map_err(|e| StoreError::CorruptRow(format!("node {id}: {e}")))?;
        let meta = if meta.is_empty() {
            None
        } else {
            Some(serde_json::from_str(&meta)?)
        };

        Ok(Node {
            id,
            scope: scope.clone(),
            kind,
            label,
            meta,
        })
    }

    fn decode_edge(scope: &ScopeId, row: &sqlx::sqlite::SqliteRow) -> Result<Edge, StoreError> {
        let source: String = row.try_get("source")?;
        let target: String = row.try_get("target")?;
        let rel: String = row.try_get("rel")?;

        let rel = Relation::from_str(&rel)
            .map_err(|e| StoreError::CorruptRow(format!("edge {source}->{target}: {e}")))?;

        Ok(Edge {
            scope: scope.clone(),
            source,
            target,
            rel,
        })
    }
}

#[async_trait]
impl GraphStore for SqliteGraphStore {
    async fn register_upload(&self, scope: &ScopeId, name: &str) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO uploads(id, name) VALUES(?, ?)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name",
        )
        .bind(scope.as_str())
        .bind(name)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn upload_name(&self, scope: &ScopeId) -> Result<Option<String>, StoreError> {
        let row = sqlx::query("SELECT name FROM uploads WHERE id = ?")
            .bind(scope.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| r.try_get::<String, _>("name"))
            .transpose()
            .map_err(StoreError::from)
    }

    async fn upsert_node(&self, node: &Node) -> Result<(), StoreError> {
        let meta = Self::encode_meta(node)?;
        sqlx::query(
            "INSERT INTO nodes(id, upload_id, type, label, meta) VALUES(?, ?, ?, ?, ?)
             ON CONFLICT(id, upload_id) DO UPDATE
             SET type = excluded.type, label = excluded.label, meta = excluded.meta",
        )
        .bind(&node.id)
        .bind(node.scope.as_str())
        .bind(node.kind.as_str())
        .bind(&node.label)
        .bind(meta)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_node_if_absent(&self, node: &Node) -> Result<(), StoreError> {
        let meta = Self::encode_meta(node)?;
        sqlx::query(
            "INSERT INTO nodes(id, upload_id, type, label, meta) VALUES(?, ?, ?, ?, ?)
             ON CONFLICT(id, upload_id) DO NOTHING",
        )
        .bind(&node.id)
        .bind(node.scope.as_str())
        .bind(node.kind.as_str())
        .bind(&node.label)
        .bind(meta)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn append_edge(&self, edge: &Edge) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO edges(upload_id, source, target, rel) VALUES(?, ?, ?, ?)")
            .bind(edge.scope.as_str())
            .bind(&edge.source)
            .bind(&edge.target)
            .bind(edge.rel.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_nodes(&self, scope: &ScopeId) -> Result<Vec<Node>, StoreError> {
        let rows = sqlx::query("SELECT id, type, label, meta FROM nodes WHERE upload_id = ?")
            .bind(scope.as_str())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(|r| Self::decode_node(scope, r)).collect()
    }

    async fn list_edges(&self, scope: &ScopeId) -> Result<Vec<Edge>, StoreError> {
        let rows = sqlx::query("SELECT source, target, rel FROM edges WHERE upload_id = ?")
            .bind(scope.as_str())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(|r| Self::decode_edge(scope, r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CommitMeta;

    fn scope(s: &str) -> ScopeId {
        ScopeId::new(s)
    }

    #[tokio::test]
    async fn schema_is_idempotent() {
        let store = SqliteGraphStore::in_memory().await.unwrap();
        store.init_schema().await.unwrap();
    }

    #[tokio::test]
    async fn insert_if_absent_keeps_first_label() {
        let store = SqliteGraphStore::in_memory().await.unwrap();
        let s = scope("s1");

        store
            .insert_node_if_absent(&Node::new(s.clone(), "abc", NodeKind::Tree, "src"))
            .await
            .unwrap();
        store
            .insert_node_if_absent(&Node::new(s.clone(), "abc", NodeKind::Tree, "lib"))
            .await
            .unwrap();

        let nodes = store.list_nodes(&s).await.unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].label, "src");
    }

    #[tokio::test]
    async fn upsert_takes_latest_metadata() {
        let store = SqliteGraphStore::in_memory().await.unwrap();
        let s = scope("s1");

        let meta_a = CommitMeta {
            author: "a".into(),
            email: "a@x".into(),
            time: 1,
            message: "first".into(),
        };
        let meta_b = CommitMeta {
            author: "b".into(),
            email: "b@x".into(),
            time: 2,
            message: "second".into(),
        };

        store
            .upsert_node(
                &Node::new(s.clone(), "abc", NodeKind::Commit, "first")
                    .with_meta(meta_a.to_value()),
            )
            .await
            .unwrap();
        store
            .upsert_node(
                &Node::new(s.clone(), "abc", NodeKind::Commit, "second")
                    .with_meta(meta_b.to_value()),
            )
            .await
            .unwrap();

        let nodes = store.list_nodes(&s).await.unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].label, "second");
        let stored = CommitMeta::from_value(nodes[0].meta.as_ref().unwrap()).unwrap();
        assert_eq!(stored, meta_b);
    }

    #[tokio::test]
    async fn duplicate_edges_are_kept() {
        let store = SqliteGraphStore::in_memory().await.unwrap();
        let s = scope("s1");

        let edge = Edge::new(s.clone(), "t1", "b1", Relation::TreeBlob);
        store.append_edge(&edge).await.unwrap();
        store.append_edge(&edge).await.unwrap();

        let edges = store.list_edges(&s).await.unwrap();
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0], edges[1]);
    }

    #[tokio::test]
    async fn scopes_are_isolated() {
        let store = SqliteGraphStore::in_memory().await.unwrap();
        let s1 = scope("s1");
        let s2 = scope("s2");

        store
            .insert_node_if_absent(&Node::new(s1.clone(), "abc", NodeKind::Blob, "a.txt"))
            .await
            .unwrap();
        store
            .insert_node_if_absent(&Node::new(s2.clone(), "abc", NodeKind::Blob, "b.txt"))
            .await
            .unwrap();
        store
            .append_edge(&Edge::new(s1.clone(), "t", "abc", Relation::TreeBlob))
            .await
            .unwrap();

        assert_eq!(store.list_nodes(&s1).await.unwrap()[0].label, "a.txt");
        assert_eq!(store.list_nodes(&s2).await.unwrap()[0].label, "b.txt");
        assert_eq!(store.list_edges(&s2).await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn upload_name_round_trip() {
        let store = SqliteGraphStore::in_memory().await.unwrap();
        let s = scope("s1");

        assert!(store.upload_name(&s).await.unwrap().is_none());
        store.register_upload(&s, "repo.zip").await.unwrap();
        assert_eq!(
            store.upload_name(&s).await.unwrap().as_deref(),
            Some("repo.zip")
        );
    }
}
