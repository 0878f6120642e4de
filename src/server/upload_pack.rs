use crate::areas::repository::Repository;
use crate::artifacts::core::error::BruvError;
use crate::artifacts::pack::collector::ObjectCollector;
use crate::artifacts::pack::pack_file::PackEncoder;
use crate::artifacts::protocol::command_line::{CommandLine, RefLine};
use crate::artifacts::protocol::framing;
use tokio::io::AsyncWrite;

/// Advertise the branch tip, then send the objects reachable from it
pub(super) async fn handle<W>(
    repository: &Repository,
    command: &CommandLine,
    writer: &mut W,
) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin + Send,
{
    let branch = match &command.branch {
        Some(branch) => branch.clone(),
        None => repository.refs().current_branch()?,
    };
    let tip = repository
        .refs()
        .read_ref(&branch)?
        .ok_or_else(|| BruvError::NotFound(format!("branch '{branch}' has no commits")))?;

    let objects =
        ObjectCollector::new(repository.database()).collect_selected(&tip, &command.select)?;
    let pack = PackEncoder::new(repository.database()).encode(&objects)?;

    framing::write_line(writer, &RefLine::new(tip, branch.clone()).to_string()).await?;
    framing::write_pack(writer, &pack).await?;

    tracing::info!(
        branch = %branch,
        objects = objects.len(),
        selected = command.select.len(),
        "sent pack"
    );

    Ok(())
}
