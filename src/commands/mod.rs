//! Command implementations
//!
//! Commands are organized into two categories:
//!
//! - `plumbing`: low-level commands for direct object manipulation
//!   (hash-object, cat-file)
//! - `porcelain`: user-facing commands for version control workflows
//!   (init, add, commit, checkout, branch)
//!
//! Plumbing commands provide building blocks, while porcelain commands
//! compose them into higher-level operations.

pub mod plumbing;
pub mod porcelain;
