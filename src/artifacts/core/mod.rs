//! Core utilities and shared types
//!
//! This module contains shared utilities used across the application.
//!
//! - `error`: the error taxonomy surfaced by the object store, index, pack codec and workflow
//! - `glob`: glob-to-regex translation used by the staging policies

pub mod error;
pub mod glob;
