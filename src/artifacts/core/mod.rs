//! Shared failure taxonomy
//!
//! Every store surfaces its failures through [`RepoError`] so porcelain
//! callers can match on the failure kind instead of scraping messages.
//! The variants travel inside `anyhow::Error` and are recovered with
//! `downcast_ref` where a command needs to branch on them.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// No stored object matches the given hash or prefix.
    #[error("object '{0}' not found")]
    ObjectNotFound(String),

    /// A hash prefix matches more than one stored object.
    #[error("prefix '{prefix}' is ambiguous ({count} matching objects)")]
    AmbiguousHash { prefix: String, count: usize },

    /// A named reference does not exist or has no commit yet.
    #[error("reference '{0}' not found")]
    RefNotFound(String),

    /// A path given to `add` does not exist in the working directory.
    #[error("path '{0}' not found")]
    PathNotFound(PathBuf),

    /// The index is empty or identical to the current HEAD tree.
    #[error("nothing to commit")]
    NothingToCommit,
}
