//! Porcelain commands (user-facing operations)
//!
//! ## Commands
//!
//! - `init`: Initialize a new repository
//! - `add`: Stage files for commit
//! - `commit`: Create a new commit from the index
//! - `checkout`: Switch the working directory to a branch or commit
//! - `branch`: Create or list branches

pub mod add;
pub mod branch;
pub mod checkout;
pub mod commit;
pub mod init;
