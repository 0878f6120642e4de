//! Plumbing commands
//!
//! Direct access to the object database, used by scripts and as building
//! blocks for the porcelain.
//!
//! - `hash-object`: Compute a blob id and optionally store it
//! - `cat-file`: Print a stored object, accepting abbreviated ids
//! - `ls-tree`: List the contents of a tree
//! - `write_commit`: Snapshot the index and advance the current branch

pub mod cat_file;
pub mod hash_object;
pub mod ls_tree;
pub mod write_commit;
