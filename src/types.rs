//! Core graph types: nodes, edges, scopes and commit metadata.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Identifier of one parsed upload's graph.
///
/// The same git object id can appear in many uploaded repositories (identical
/// content hashes identically), so every stored row is scoped by the upload
/// that produced it. `(id, scope)` is the unique identity of a node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeId(String);

impl ScopeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ScopeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ScopeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Kind of git object a node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Commit,
    Tree,
    Blob,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Commit => "commit",
            NodeKind::Tree => "tree",
            NodeKind::Blob => "blob",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "commit" => Ok(NodeKind::Commit),
            "tree" => Ok(NodeKind::Tree),
            "blob" => Ok(NodeKind::Blob),
            other => Err(format!("unknown node kind: {other}")),
        }
    }
}

/// Relation carried by an edge.
///
/// Wire strings match the stored `rel` column and the exported JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relation {
    #[serde(rename = "parent")]
    Parent,
    #[serde(rename = "commit->tree")]
    CommitTree,
    #[serde(rename = "tree->tree")]
    TreeTree,
    #[serde(rename = "tree->blob")]
    TreeBlob,
}

impl Relation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::Parent => "parent",
            Relation::CommitTree => "commit->tree",
            Relation::TreeTree => "tree->tree",
            Relation::TreeBlob => "tree->blob",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Relation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "parent" => Ok(Relation::Parent),
            "commit->tree" => Ok(Relation::CommitTree),
            "tree->tree" => Ok(Relation::TreeTree),
            "tree->blob" => Ok(Relation::TreeBlob),
            other => Err(format!("unknown relation: {other}")),
        }
    }
}

/// A stored graph node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Content-addressed object id (full hex hash).
    pub id: String,
    /// Upload scope the node belongs to.
    pub scope: ScopeId,
    pub kind: NodeKind,
    /// Short human-readable label: trimmed message for commits, entry name
    /// for blobs, directory name for trees (`/` for a commit's root tree).
    pub label: String,
    /// Opaque metadata bag; populated for commits, `None` otherwise.
    pub meta: Option<Value>,
}

impl Node {
    pub fn new(
        scope: ScopeId,
        id: impl Into<String>,
        kind: NodeKind,
        label: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            scope,
            kind,
            label: label.into(),
            meta: None,
        }
    }

    pub fn with_meta(mut self, meta: Value) -> Self {
        self.meta = Some(meta);
        self
    }
}

/// A stored graph edge. Edges carry no identity and are never deduplicated:
/// the same `(source, target, rel)` triple may be appended once per traversal
/// path that reaches it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub scope: ScopeId,
    pub source: String,
    pub target: String,
    pub rel: Relation,
}

impl Edge {
    pub fn new(
        scope: ScopeId,
        source: impl Into<String>,
        target: impl Into<String>,
        rel: Relation,
    ) -> Self {
        Self {
            scope,
            source: source.into(),
            target: target.into(),
            rel,
        }
    }
}

/// Outcome of one parse run.
///
/// Per-ref and per-object failures degrade coverage without aborting the
/// parse; they are counted and described here. Store failures are not
/// reported this way - they abort the run.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ParseReport {
    /// Branch/tag refs whose ancestry was walked.
    pub refs_walked: usize,
    /// Branch/tag refs skipped because they could not be resolved or walked.
    pub refs_skipped: usize,
    /// Distinct commits visited this run.
    pub commits_visited: usize,
    /// Tree nodes written (root trees plus subtree entries).
    pub trees_written: usize,
    /// Blob nodes written.
    pub blobs_written: usize,
    /// Objects skipped because they failed to resolve.
    pub objects_skipped: usize,
    /// Time taken in milliseconds.
    pub duration_ms: u64,
    /// Descriptions of non-fatal failures encountered along the way.
    #[serde(default)]
    pub errors: Vec<String>,
}

/// Metadata bag stored on commit nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CommitMeta {
    /// Author's name.
    pub author: String,
    /// Author's email address.
    pub email: String,
    /// Author timestamp, unix epoch seconds.
    pub time: i64,
    /// Full commit message.
    pub message: String,
}

impl CommitMeta {
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn from_value(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_kind_wire_strings() {
        assert_eq!(
            serde_json::to_string(&NodeKind::Commit).unwrap(),
            "\"commit\""
        );
        assert_eq!(serde_json::to_string(&NodeKind::Blob).unwrap(), "\"blob\"");
        assert_eq!("tree".parse::<NodeKind>().unwrap(), NodeKind::Tree);
        assert!("branch".parse::<NodeKind>().is_err());
    }

    #[test]
    fn relation_wire_strings() {
        assert_eq!(Relation::CommitTree.as_str(), "commit->tree");
        assert_eq!(
            serde_json::to_string(&Relation::TreeBlob).unwrap(),
            "\"tree->blob\""
        );
        for rel in [
            Relation::Parent,
            Relation::CommitTree,
            Relation::TreeTree,
            Relation::TreeBlob,
        ] {
            assert_eq!(rel.as_str().parse::<Relation>().unwrap(), rel);
        }
    }

    #[test]
    fn scope_id_is_transparent_in_json() {
        let scope = ScopeId::new("upload-1");
        assert_eq!(serde_json::to_string(&scope).unwrap(), "\"upload-1\"");
    }

    #[test]
    fn commit_meta_round_trip() {
        let meta = CommitMeta {
            author: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            time: 1_700_000_000,
            message: "initial import".to_string(),
        };
        let value = meta.to_value();
        assert_eq!(value["author"], "Ada");
        assert_eq!(CommitMeta::from_value(&value).unwrap(), meta);
    }
}
