use crate::areas::repository::Repository;
use crate::artifacts::branch::DEFAULT_BRANCH;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::core::error::BruvError;
use crate::artifacts::pack::pack_file::PackDecoder;
use crate::artifacts::protocol::OK_REPLY;
use crate::artifacts::protocol::command_line::{CommandLine, RefLine};
use crate::artifacts::protocol::framing;
use tokio::io::{AsyncBufRead, AsyncWrite};

/// Accept a pushed branch; protected branches only move through merge requests
pub(super) async fn handle<R, W>(
    repository: &Repository,
    command: &CommandLine,
    reader: &mut R,
    writer: &mut W,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    let branch = match &command.branch {
        Some(branch) => branch.clone(),
        None => BranchName::try_parse(DEFAULT_BRANCH)?,
    };
    ensure_writable(&branch)?;

    framing::write_line(writer, OK_REPLY).await?;

    let ref_line = RefLine::parse(&framing::expect_line(reader).await?)?;
    if ref_line.branch != branch {
        return Err(BruvError::WriteRejected(format!(
            "push announced {branch} but sent {}",
            ref_line.branch
        ))
        .into());
    }
    ensure_writable(&ref_line.branch)?;

    let pack = framing::read_pack(reader).await?;
    let installed = PackDecoder::new(repository.database()).decode(&pack)?;
    repository.database().load_commit(&ref_line.oid)?;

    repository.refs().update_ref(&branch, &ref_line.oid)?;
    framing::write_line(writer, &format!("{OK_REPLY} {}", ref_line.oid)).await?;

    tracing::info!(
        branch = %branch,
        tip = %ref_line.oid,
        objects = installed.len(),
        "accepted push"
    );

    Ok(())
}

fn ensure_writable(branch: &BranchName) -> anyhow::Result<()> {
    if branch.is_protected() {
        return Err(BruvError::WriteRejected(format!(
            "Direct pushes to {branch} are not allowed. Use 'bruv merge' command instead."
        ))
        .into());
    }

    Ok(())
}
