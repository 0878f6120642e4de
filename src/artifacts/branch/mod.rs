//! Branch names and symbolic refs

pub mod branch_name;

/// Names that would be ambiguous or unsafe as ref file names
pub const INVALID_BRANCH_NAME_REGEX: &str =
    r"^\.|\/\.|\.\.|^\/|\/$|\.lock$|@\{|[\x00-\x20\*:\?\[\\~\^\x7f]";

/// Branches that only move through an approved merge request
pub const PROTECTED_BRANCHES: [&str; 2] = ["main", "master"];

/// Branch HEAD names in a freshly initialised repository
pub const DEFAULT_BRANCH: &str = "main";
