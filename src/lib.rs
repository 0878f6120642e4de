//! bruv: a small distributed version-control engine
//!
//! A content-addressed object store, a staging index, branches, a pack
//! protocol served over TCP, and merge requests gating protected branches.

pub mod areas;
pub mod artifacts;
pub mod commands;
pub mod server;
