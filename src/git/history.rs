//! Commit-history traversal across branch and tag tips.

use std::collections::HashSet;

use git2::{Oid, Repository, Sort};

use crate::error::{GitError, GraphError, StoreError};
use crate::git::tree::TreeWalker;
use crate::store::GraphStore;
use crate::types::{CommitMeta, Edge, Node, NodeKind, ParseReport, Relation, ScopeId};

/// Label given to every commit's root tree node.
const ROOT_TREE_LABEL: &str = "/";

/// Walks every commit reachable from every branch and tag tip, writing
/// commit nodes, `parent` edges, and handing each root tree to a
/// [`TreeWalker`].
///
/// Reference-enumeration failure aborts the parse; a single ref that fails
/// to resolve or iterate is skipped with a warning. An in-run visited set
/// keeps commits reachable from several refs from being processed twice;
/// edges already written for them are left as-is and the store itself never
/// deduplicates edges.
pub struct HistoryWalker<'a, S: GraphStore + ?Sized> {
    store: &'a S,
    scope: ScopeId,
    visited: HashSet<Oid>,
}

impl<'a, S: GraphStore + ?Sized> HistoryWalker<'a, S> {
    pub fn new(store: &'a S, scope: ScopeId) -> Self {
        Self {
            store,
            scope,
            visited: HashSet::new(),
        }
    }

    /// Walk all branch and tag tips of `repo`.
    pub async fn walk(
        &mut self,
        repo: &Repository,
        report: &mut ParseReport,
    ) -> Result<(), GraphError> {
        let references = repo
            .references()
            .map_err(|e| GitError::RefEnumeration(e.message().to_string()))?;

        // Resolve tips up front; holding git2 reference iterators across
        // store writes is not possible anyway.
        let mut tips: Vec<(String, Oid)> = Vec::new();
        for reference in references {
            let reference = match reference {
                Ok(r) => r,
                Err(e) => {
                    tracing::debug!("Skipping unreadable reference: {e}");
                    continue;
                }
            };
            // Only branches and tags are traversal roots; remotes, notes
            // and other namespaces are ignored.
            if !(reference.is_branch() || reference.is_tag()) {
                continue;
            }
            let name = reference.name().unwrap_or("<non-utf8 ref>").to_string();
            match reference.peel_to_commit() {
                Ok(commit) => tips.push((name, commit.id())),
                Err(e) => {
                    tracing::warn!("Skipping ref '{name}': cannot resolve to a commit: {e}");
                    report.refs_skipped += 1;
                    report.errors.push(format!("ref '{name}': {e}"));
                }
            }
        }

        tracing::info!("Walking {} branch/tag tips", tips.len());

        for (name, tip) in tips {
            self.walk_ref(repo, &name, tip, report).await?;
        }

        Ok(())
    }

    /// Walk the ancestry of one ref tip. Git failures skip the ref
    /// (degrading coverage); store failures propagate and abort the parse.
    async fn walk_ref(
        &mut self,
        repo: &Repository,
        name: &str,
        tip: Oid,
        report: &mut ParseReport,
    ) -> Result<(), StoreError> {
        let oids = match self.collect_ancestry(repo, tip) {
            Ok(oids) => oids,
            Err(e) => {
                tracing::warn!("Skipping ref '{name}': log iteration failed: {e}");
                report.refs_skipped += 1;
                report.errors.push(format!("ref '{name}': {e}"));
                return Ok(());
            }
        };

        tracing::debug!("Ref '{name}': {} reachable commits", oids.len());

        for oid in oids {
            if !self.visited.insert(oid) {
                continue;
            }
            let commit = match repo.find_commit(oid) {
                Ok(c) => c,
                Err(e) => {
                    tracing::debug!("Skipping unresolvable commit {oid}: {e}");
                    report.objects_skipped += 1;
                    continue;
                }
            };
            self.process_commit(repo, &commit, report).await?;
        }

        report.refs_walked += 1;
        Ok(())
    }

    /// Revwalk the full ancestry of `tip` in topological order, parents
    /// after children.
    fn collect_ancestry(&self, repo: &Repository, tip: Oid) -> Result<Vec<Oid>, git2::Error> {
        let mut revwalk = repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        revwalk.push(tip)?;
        revwalk.collect()
    }

    /// Write one commit's node, its parent stubs and edges, and descend
    /// into its root tree.
    async fn process_commit(
        &self,
        repo: &Repository,
        commit: &git2::Commit<'_>,
        report: &mut ParseReport,
    ) -> Result<(), StoreError> {
        let id = commit.id().to_string();
        let author = commit.author();
        let meta = CommitMeta {
            author: author.name().unwrap_or("").to_string(),
            email: author.email().unwrap_or("").to_string(),
            time: author.when().seconds(),
            message: commit.message().unwrap_or("").to_string(),
        };
        let label = meta.message.trim().to_string();

        // Commit nodes overwrite: a commit first seen as a parent stub gets
        // its full metadata filled in when visited as a traversal root.
        let node = Node::new(self.scope.clone(), id.clone(), NodeKind::Commit, label)
            .with_meta(meta.to_value());
        self.store.upsert_node(&node).await?;

        for parent_id in commit.parent_ids() {
            // Minimal stub; no existence check before the edge write, so a
            // parent reachable along several paths collects several edges.
            let stub = Node::new(
                self.scope.clone(),
                parent_id.to_string(),
                NodeKind::Commit,
                "",
            );
            self.store.insert_node_if_absent(&stub).await?;
            self.store
                .append_edge(&Edge::new(
                    self.scope.clone(),
                    id.clone(),
                    parent_id.to_string(),
                    Relation::Parent,
                ))
                .await?;
        }

        let tree_id = commit.tree_id();
        if repo.find_tree(tree_id).is_ok() {
            let root = Node::new(
                self.scope.clone(),
                tree_id.to_string(),
                NodeKind::Tree,
                ROOT_TREE_LABEL,
            );
            self.store.insert_node_if_absent(&root).await?;
            self.store
                .append_edge(&Edge::new(
                    self.scope.clone(),
                    id.clone(),
                    tree_id.to_string(),
                    Relation::CommitTree,
                ))
                .await?;
            report.trees_written += 1;

            let walker = TreeWalker::new(self.store, self.scope.clone());
            walker.walk(repo, tree_id, report).await?;
        } else {
            tracing::debug!("Skipping unresolvable root tree {tree_id} of commit {id}");
            report.objects_skipped += 1;
        }

        report.commits_visited += 1;
        Ok(())
    }
}
