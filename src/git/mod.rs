//! Git history and tree-object walking.
//!
//! [`history::HistoryWalker`] enumerates branch and tag tips and walks each
//! one's ancestry; [`tree::TreeWalker`] descends a commit's root tree. Both
//! write through an explicit [`crate::store::GraphStore`] handle.

pub mod history;
pub mod tree;

pub use history::HistoryWalker;
pub use tree::TreeWalker;
