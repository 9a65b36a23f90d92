//! In-memory graph store for tests and ephemeral runs.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::GraphStore;
use crate::error::StoreError;
use crate::types::{Edge, Node, ScopeId};

#[derive(Debug, Default)]
struct Inner {
    uploads: BTreeMap<ScopeId, String>,
    /// Nodes keyed by `(scope, id)`. BTreeMap gives deterministic listing
    /// order, which keeps test assertions stable.
    nodes: BTreeMap<(ScopeId, String), Node>,
    edges: Vec<Edge>,
}

/// In-memory graph store.
#[derive(Debug, Default)]
pub struct InMemoryGraphStore {
    inner: RwLock<Inner>,
}

impl InMemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total node count across all scopes.
    pub async fn node_count(&self) -> usize {
        self.inner.read().await.nodes.len()
    }

    /// Total edge count across all scopes.
    pub async fn edge_count(&self) -> usize {
        self.inner.read().await.edges.len()
    }
}

#[async_trait]
impl GraphStore for InMemoryGraphStore {
    async fn register_upload(&self, scope: &ScopeId, name: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.uploads.insert(scope.clone(), name.to_string());
        Ok(())
    }

    async fn upload_name(&self, scope: &ScopeId) -> Result<Option<String>, StoreError> {
        Ok(self.inner.read().await.uploads.get(scope).cloned())
    }

    async fn upsert_node(&self, node: &Node) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner
            .nodes
            .insert((node.scope.clone(), node.id.clone()), node.clone());
        Ok(())
    }

    async fn insert_node_if_absent(&self, node: &Node) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner
            .nodes
            .entry((node.scope.clone(), node.id.clone()))
            .or_insert_with(|| node.clone());
        Ok(())
    }

    async fn append_edge(&self, edge: &Edge) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.edges.push(edge.clone());
        Ok(())
    }

    async fn list_nodes(&self, scope: &ScopeId) -> Result<Vec<Node>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .nodes
            .values()
            .filter(|n| &n.scope == scope)
            .cloned()
            .collect())
    }

    async fn list_edges(&self, scope: &ScopeId) -> Result<Vec<Edge>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .edges
            .iter()
            .filter(|e| &e.scope == scope)
            .cloned()
            .collect())
    }
}
