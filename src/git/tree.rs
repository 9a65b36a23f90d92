//! Tree-object traversal.

use git2::{ObjectType, Oid, Repository};

use crate::error::StoreError;
use crate::store::GraphStore;
use crate::types::{Edge, Node, NodeKind, ParseReport, Relation, ScopeId};

enum EntryKind {
    Blob,
    Tree,
}

struct EntryInfo {
    id: Oid,
    name: String,
    kind: EntryKind,
}

/// Walks a tree object's entries, writing tree/blob nodes and edges.
///
/// Descent uses an explicit work-stack, so depth is bounded by the stack's
/// heap allocation rather than the call stack. The object graph is a
/// content-addressed DAG, so no cycle detection is needed; the same subtree
/// may still be reached along many paths, in which case its node dedupes but
/// the edges leading to it do not.
pub struct TreeWalker<'a, S: GraphStore + ?Sized> {
    store: &'a S,
    scope: ScopeId,
}

impl<'a, S: GraphStore + ?Sized> TreeWalker<'a, S> {
    pub fn new(store: &'a S, scope: ScopeId) -> Self {
        Self { store, scope }
    }

    /// Visit every entry reachable from the tree at `root`.
    ///
    /// Blob entries get a node with the entry name as label (overwrite
    /// semantics: a blob shared under several filenames keeps the last
    /// writer's name) and a `tree->blob` edge. Subtree entries get an
    /// insert-if-absent node, a `tree->tree` edge, and are pushed for
    /// descent. Entries that fail to resolve skip their branch of the walk;
    /// store failures abort it.
    pub async fn walk(
        &self,
        repo: &Repository,
        root: Oid,
        report: &mut ParseReport,
    ) -> Result<(), StoreError> {
        let mut stack = vec![root];

        while let Some(tree_id) = stack.pop() {
            let entries = match self.tree_entries(repo, tree_id) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::debug!("Skipping unresolvable tree {tree_id}: {e}");
                    report.objects_skipped += 1;
                    continue;
                }
            };

            for entry in entries {
                match entry.kind {
                    EntryKind::Blob => {
                        let node = Node::new(
                            self.scope.clone(),
                            entry.id.to_string(),
                            NodeKind::Blob,
                            entry.name,
                        );
                        self.store.upsert_node(&node).await?;
                        self.store
                            .append_edge(&Edge::new(
                                self.scope.clone(),
                                tree_id.to_string(),
                                entry.id.to_string(),
                                Relation::TreeBlob,
                            ))
                            .await?;
                        report.blobs_written += 1;
                    }
                    EntryKind::Tree => {
                        if let Err(e) = repo.find_tree(entry.id) {
                            tracing::debug!("Skipping unresolvable subtree {}: {e}", entry.id);
                            report.objects_skipped += 1;
                            continue;
                        }
                        let node = Node::new(
                            self.scope.clone(),
                            entry.id.to_string(),
                            NodeKind::Tree,
                            entry.name,
                        );
                        self.store.insert_node_if_absent(&node).await?;
                        self.store
                            .append_edge(&Edge::new(
                                self.scope.clone(),
                                tree_id.to_string(),
                                entry.id.to_string(),
                                Relation::TreeTree,
                            ))
                            .await?;
                        report.trees_written += 1;
                        stack.push(entry.id);
                    }
                }
            }
        }

        Ok(())
    }

    /// Extract owned entry descriptions so no git2 handles are held while
    /// the store writes happen.
    fn tree_entries(&self, repo: &Repository, id: Oid) -> Result<Vec<EntryInfo>, git2::Error> {
        let tree = repo.find_tree(id)?;
        Ok(tree
            .iter()
            .filter_map(|entry| {
                let name = entry.name()?.to_string();
                let kind = match entry.kind() {
                    Some(ObjectType::Blob) => EntryKind::Blob,
                    Some(ObjectType::Tree) => EntryKind::Tree,
                    // Submodule commits and exotic entries are not part of
                    // this repository's object graph.
                    _ => return None,
                };
                Some(EntryInfo {
                    id: entry.id(),
                    name,
                    kind,
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{GraphStore, InMemoryGraphStore};
    use std::fs;
    use std::path::Path;

    fn scope() -> ScopeId {
        ScopeId::new("test-scope")
    }

    /// Build a repo with a nested layout and return its root tree id.
    fn repo_with_tree(dir: &Path) -> (Repository, Oid) {
        let repo = Repository::init(dir).unwrap();
        fs::write(dir.join("readme.md"), "hello").unwrap();
        fs::create_dir_all(dir.join("src")).unwrap();
        fs::write(dir.join("src/main.rs"), "fn main() {}").unwrap();

        let tree_id = {
            let mut index = repo.index().unwrap();
            index.add_path(Path::new("readme.md")).unwrap();
            index.add_path(Path::new("src/main.rs")).unwrap();
            index.write().unwrap();
            index.write_tree().unwrap()
        };
        (repo, tree_id)
    }

    #[tokio::test]
    async fn walks_nested_trees_and_blobs() {
        let dir = tempfile::tempdir().unwrap();
        let (repo, root) = repo_with_tree(dir.path());

        let store = InMemoryGraphStore::new();
        let walker = TreeWalker::new(&store, scope());
        let mut report = ParseReport::default();
        walker.walk(&repo, root, &mut report).await.unwrap();

        let nodes = store.list_nodes(&scope()).await.unwrap();
        let labels: Vec<&str> = nodes.iter().map(|n| n.label.as_str()).collect();
        assert!(labels.contains(&"readme.md"));
        assert!(labels.contains(&"src"));
        assert!(labels.contains(&"main.rs"));

        let edges = store.list_edges(&scope()).await.unwrap();
        assert_eq!(
            edges.iter().filter(|e| e.rel == Relation::TreeBlob).count(),
            2
        );
        assert_eq!(
            edges.iter().filter(|e| e.rel == Relation::TreeTree).count(),
            1
        );
        assert_eq!(report.blobs_written, 2);
        assert_eq!(report.trees_written, 1);
    }

    #[tokio::test]
    async fn shared_blob_dedupes_as_node_but_not_as_edges() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        // Two directories holding a byte-identical file: one blob object,
        // reachable along two paths.
        for sub in ["a", "b"] {
            fs::create_dir_all(dir.path().join(sub)).unwrap();
            fs::write(dir.path().join(sub).join("same.txt"), "contents").unwrap();
        }
        let root = {
            let mut index = repo.index().unwrap();
            index.add_path(Path::new("a/same.txt")).unwrap();
            index.add_path(Path::new("b/same.txt")).unwrap();
            index.write().unwrap();
            index.write_tree().unwrap()
        };

        let store = InMemoryGraphStore::new();
        let walker = TreeWalker::new(&store, scope());
        let mut report = ParseReport::default();
        walker.walk(&repo, root, &mut report).await.unwrap();

        let nodes = store.list_nodes(&scope()).await.unwrap();
        let blob_nodes: Vec<_> = nodes.iter().filter(|n| n.kind == NodeKind::Blob).collect();
        assert_eq!(blob_nodes.len(), 1, "identical content is one blob node");

        let edges = store.list_edges(&scope()).await.unwrap();
        let blob_edges: Vec<_> = edges
            .iter()
            .filter(|e| e.rel == Relation::TreeBlob)
            .collect();
        assert_eq!(blob_edges.len(), 2, "one edge per reaching path");
        assert_eq!(blob_edges[0].target, blob_edges[1].target);
    }

    #[tokio::test]
    async fn unresolvable_root_is_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();

        let store = InMemoryGraphStore::new();
        let walker = TreeWalker::new(&store, scope());
        let mut report = ParseReport::default();
        let bogus: Oid = "0123456789012345678901234567890123456789".parse().unwrap();
        walker.walk(&repo, bogus, &mut report).await.unwrap();

        assert_eq!(report.objects_skipped, 1);
        assert!(store.list_nodes(&scope()).await.unwrap().is_empty());
    }
}
