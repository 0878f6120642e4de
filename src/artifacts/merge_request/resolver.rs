use crate::areas::database::Database;
use crate::artifacts::core::error::BruvError;
use crate::artifacts::merge_request::merge_request::MergeRequest;
use crate::artifacts::objects::object_id::ObjectId;

/// Produces the new target tip when the source is not a fast-forward of it
pub trait MergeResolver: Send + Sync {
    fn resolve(&self, database: &Database, request: &MergeRequest) -> anyhow::Result<ObjectId>;
}

/// Refuses every merge that is not a fast-forward
#[derive(Debug, Clone, Copy, Default)]
pub struct FastForwardOnly;

impl MergeResolver for FastForwardOnly {
    fn resolve(&self, _database: &Database, request: &MergeRequest) -> anyhow::Result<ObjectId> {
        Err(BruvError::Unsupported(format!(
            "{} cannot be fast-forwarded: {} has diverged from {}",
            request.id(),
            request.source(),
            request.target()
        ))
        .into())
    }
}
