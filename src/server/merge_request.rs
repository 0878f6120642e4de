use crate::areas::repository::Repository;
use crate::artifacts::core::error::BruvError;
use crate::artifacts::protocol::OK_REPLY;
use crate::artifacts::protocol::command_line::MergeRequestLine;
use crate::artifacts::protocol::framing;
use tokio::io::{AsyncBufRead, AsyncWrite};

const ANONYMOUS_REQUESTER: &str = "anonymous";

/// Record a pending merge request and reply with its id
pub(super) async fn handle<R, W>(
    repository: &Repository,
    reader: &mut R,
    writer: &mut W,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    framing::write_line(writer, OK_REPLY).await?;

    let line = framing::read_line(reader)
        .await?
        .ok_or_else(|| BruvError::InvalidState("invalid merge request format".into()))?;
    let request = MergeRequestLine::parse(&line)?;

    let merge_request = repository.submit_merge_request(
        &request.source,
        &request.target,
        request.requester.unwrap_or_else(|| ANONYMOUS_REQUESTER.to_string()),
    )?;

    framing::write_line(writer, &format!("Merge request created: {}", merge_request.id())).await?;

    Ok(())
}
