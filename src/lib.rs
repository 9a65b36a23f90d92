//! # repograph - Git Object Graph Extraction and Storage
//!
//! Walks a git repository's commit/tree/blob object graph and persists it as
//! a deduplicated node/edge graph in a keyed store, scoped per upload, then
//! transforms stored rows back into a JSON node/link structure for a
//! rendering client.
//!
//! ## Pipeline
//!
//! ```text
//! extracted dir ──▶ locator ──▶ HistoryWalker ──▶ TreeWalker ──▶ GraphStore
//!                                                                   │
//!                                    export_graph ◀────────────────┘
//! ```
//!
//! Nodes are deduplicated by `(id, scope)`; edges are appended once per
//! traversal path and never deduplicated, so edge volume follows the number
//! of paths reaching an object, not the number of distinct objects.
//!
//! ## Usage Example
//!
//! ```no_run
//! use repograph::export::export_graph;
//! use repograph::pipeline::parse_repository;
//! use repograph::store::{GraphStore, InMemoryGraphStore};
//! use repograph::types::ScopeId;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = InMemoryGraphStore::new();
//!     let scope = ScopeId::new("upload-1");
//!     store.register_upload(&scope, "my-repo.zip").await?;
//!
//!     let report = parse_repository(&store, "./extracted".as_ref(), &scope).await?;
//!     println!("visited {} commits", report.commits_visited);
//!
//!     let graph = export_graph(&store, &scope).await?;
//!     println!("{}", serde_json::to_string_pretty(&graph)?);
//!     Ok(())
//! }
//! ```

/// Configuration management with environment variable overrides
pub mod config;

/// Error types and utilities
pub mod error;

/// Transform of stored rows into the rendering-ready node/link structure
pub mod export;

/// Commit-history and tree-object walking
pub mod git;

/// Repository location inside an extracted directory tree
pub mod locator;

/// The parse entry point tying locator, walkers and store together
pub mod pipeline;

/// Graph storage backends (SQLite and in-memory)
pub mod store;

/// Core graph types: nodes, edges, scopes, reports
pub mod types;

pub use error::GraphError;
pub use export::export_graph;
pub use pipeline::parse_repository;
