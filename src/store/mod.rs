//! Graph storage backends.
//!
//! One parse run writes a scope's rows sequentially; different scopes may be
//! written concurrently against the same store. Nodes are keyed by
//! `(id, scope)`; edges are append-only with no uniqueness constraint.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::types::{Edge, Node, ScopeId};

/// Trait for keyed node/edge storage.
///
/// An explicit store handle is passed into every component that writes or
/// reads the graph; there is no ambient global connection.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Record an upload, associating a display name with its scope id.
    async fn register_upload(&self, scope: &ScopeId, name: &str) -> Result<(), StoreError>;

    /// Look up the display name recorded for a scope.
    async fn upload_name(&self, scope: &ScopeId) -> Result<Option<String>, StoreError>;

    /// Store a node, overwriting any existing row with the same `(id, scope)`.
    async fn upsert_node(&self, node: &Node) -> Result<(), StoreError>;

    /// Store a node unless a row with the same `(id, scope)` already exists;
    /// the first writer's label and metadata win.
    async fn insert_node_if_absent(&self, node: &Node) -> Result<(), StoreError>;

    /// Append an edge unconditionally. Duplicate `(source, target, rel)`
    /// triples are kept.
    async fn append_edge(&self, edge: &Edge) -> Result<(), StoreError>;

    /// All nodes stored for a scope. No ordering guarantee.
    async fn list_nodes(&self, scope: &ScopeId) -> Result<Vec<Node>, StoreError>;

    /// All edges stored for a scope. No ordering guarantee.
    async fn list_edges(&self, scope: &ScopeId) -> Result<Vec<Edge>, StoreError>;
}

pub use memory::InMemoryGraphStore;
pub use sqlite::{SqliteGraphStore, SqliteStoreConfig};
