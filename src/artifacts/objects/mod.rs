//! Object types and operations
//!
//! All content is stored as objects identified by SHA-1 hashes. There are
//! three kinds:
//!
//! - **Blob**: file content (raw bytes)
//! - **Tree**: directory listing (names, modes, and object IDs)
//! - **Commit**: snapshot metadata (author, message, parent commit, tree)
//!
//! All objects serialize to the same envelope: `<kind> <size>\0<content>`.
//! The object hash is the SHA-1 digest of that envelope.

pub mod blob;
pub mod commit;
pub mod object;
pub mod object_id;
pub mod object_type;
pub mod tree;

/// Length of a SHA-1 hash in hexadecimal format
pub const OBJECT_ID_LENGTH: usize = 40;
