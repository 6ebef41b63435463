//! kit — a minimal version control engine
//!
//! The repository is built from four on-disk stores under `.kit/`:
//!
//! - an object database holding content-addressed blobs, trees and commits
//! - an index (staging area) tracking the files of the next commit
//! - a refs directory holding one file per branch
//! - a HEAD file pointing at the current branch or commit
//!
//! Porcelain commands (`add`, `commit`, `checkout`, ...) are implemented as
//! methods on [`areas::repository::Repository`], which owns the stores and
//! passes the repository root explicitly to every operation.

pub mod areas;
pub mod artifacts;
pub mod commands;
