//! Core repository components
//!
//! The file-system backed state of one repository:
//!
//! - `database`: Object database for storing blobs, trees, and commits
//! - `index`: Staging area tracking what the next commit will contain
//! - `merge_requests`: Persisted merge requests
//! - `refs`: Branches and HEAD
//! - `repository`: The handle tying the areas together
//! - `workspace`: Working tree file system operations

pub mod database;
pub mod index;
pub mod merge_requests;
pub mod refs;
pub mod repository;
pub mod workspace;
