//! Transforms stored rows into the client-consumable graph structure.

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ExportError, GraphError};
use crate::store::GraphStore;
use crate::types::{CommitMeta, Node, NodeKind, Relation, ScopeId};

/// How many leading id characters stand in for an empty label.
const SHORT_ID_LEN: usize = 7;

/// JSON-ready graph for the rendering client. Output order carries no
/// meaning; layout is the client's job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphJson {
    pub nodes: Vec<NodeJson>,
    pub links: Vec<LinkJson>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeJson {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkJson {
    pub source: String,
    pub target: String,
    pub rel: Relation,
}

/// Read all rows for `scope` and shape them for rendering.
///
/// Commit nodes expose message/author/email/date from their stored
/// metadata; blob nodes expose their filename; tree nodes expose nothing
/// extra. A node with an empty label gets the first seven characters of its
/// id as a display label - the stored row is untouched.
pub async fn export_graph<S: GraphStore + ?Sized>(
    store: &S,
    scope: &ScopeId,
) -> Result<GraphJson, GraphError> {
    let nodes = store.list_nodes(scope).await?;
    let edges = store.list_edges(scope).await?;

    if nodes.is_empty() && store.upload_name(scope).await?.is_none() {
        return Err(ExportError::UnknownScope(scope.to_string()).into());
    }

    let nodes = nodes.into_iter().map(shape_node).collect();
    let links = edges
        .into_iter()
        .map(|e| LinkJson {
            source: e.source,
            target: e.target,
            rel: e.rel,
        })
        .collect();

    Ok(GraphJson { nodes, links })
}

fn shape_node(node: Node) -> NodeJson {
    let mut extra = Map::new();

    match node.kind {
        NodeKind::Commit => {
            if let Some(meta) = node.meta.as_ref().and_then(CommitMeta::from_value) {
                extra.insert("message".to_string(), Value::String(meta.message));
                extra.insert("author".to_string(), Value::String(meta.author));
                extra.insert("email".to_string(), Value::String(meta.email));
                extra.insert("date".to_string(), Value::String(render_date(meta.time)));
            }
        }
        NodeKind::Blob => {
            extra.insert("filename".to_string(), Value::String(node.label.clone()));
        }
        NodeKind::Tree => {}
    }

    let label = if node.label.is_empty() {
        node.id.chars().take(SHORT_ID_LEN).collect()
    } else {
        node.label
    };

    NodeJson {
        id: node.id,
        kind: node.kind,
        label,
        extra,
    }
}

fn render_date(unix_secs: i64) -> String {
    DateTime::from_timestamp(unix_secs, 0)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_default()
}
