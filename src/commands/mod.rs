//! Command implementations
//!
//! Every command is an `impl Repository` block taking an explicit handle:
//!
//! - `plumbing`: Low-level object access (hash-object, cat-file, ls-tree, commit-tree)
//! - `porcelain`: Local workflows (init, add, commit, branch, log, merge requests)
//! - `remote`: Clients of the server verbs (clone, pull, push, merge)

pub mod plumbing;
pub mod porcelain;
pub mod remote;
