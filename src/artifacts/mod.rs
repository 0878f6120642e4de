//! Data structures and algorithms
//!
//! - `branch`: Branch and symbolic ref names
//! - `core`: Shared error taxonomy and glob matching
//! - `database`: Tree entries as read back from the database
//! - `index`: Index binary layout
//! - `log`: Commit history traversal
//! - `merge_request`: Merge request records, states and resolvers
//! - `objects`: Object types (blob, tree, commit)
//! - `pack`: Reachability walk and pack encoding
//! - `policy`: Ignore and large-file staging policies
//! - `protocol`: Wire protocol lines and framing

pub mod branch;
pub mod core;
pub mod database;
pub mod index;
pub mod log;
pub mod merge_request;
pub mod objects;
pub mod pack;
pub mod policy;
pub mod protocol;
