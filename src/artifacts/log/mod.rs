//! Commit history traversal
//!
//! History is linear, so a log is the first-parent chain from a starting
//! commit back to the root commit.

pub mod rev_list;
