//! Porcelain commands
//!
//! User-facing workflows composed from the plumbing and the areas.
//!
//! ## Commands
//!
//! - `init`: Initialize a new repository
//! - `add`: Stage files, honouring ignore and large-file policies
//! - `commit`: Record the staged snapshot on the current branch
//! - `branch`: Create or list branches
//! - `log`: Show the history of a branch
//! - `merge_request`: Submit, approve, reject and list merge requests

pub mod add;
pub mod branch;
pub mod commit;
pub mod init;
pub mod log;
pub mod merge_request;
