//! Merge requests
//!
//! A merge request proposes moving a protected branch to the tip of another
//! branch. It captures both tips when created; approval only succeeds while
//! neither branch has moved since.
//!
//! ## File Format
//!
//! `merge-requests/mr-<id>.txt`, one `Key: value` per line:
//!
//! ```text
//! Source: feature
//! Target: main
//! SourceHash: <hex>
//! TargetHash: <hex>
//! Status: pending
//! Timestamp: <unix seconds>
//! Requester: alice
//! ApprovedBy: owner            (approved only)
//! ApprovedAt: <unix seconds>   (approved only)
//! ```

pub mod merge_request;
pub mod resolver;
pub mod status;
