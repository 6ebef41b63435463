//! Repository data structures and algorithms
//!
//! This module contains the core types the stores are built from:
//!
//! - `branch`: Branch names and checkout-target aliases
//! - `core`: Shared failure taxonomy
//! - `database`: Tree entry records read back from the object database
//! - `index`: Index/staging area data structures
//! - `objects`: Object types (blob, tree, commit)

pub mod branch;
pub mod core;
pub mod database;
pub mod index;
pub mod objects;
