//! Plumbing commands (low-level operations)
//!
//! ## Commands
//!
//! - `hash-object`: Compute an object ID and optionally store the blob
//! - `cat-file`: Print a stored object

pub mod cat_file;
pub mod hash_object;
