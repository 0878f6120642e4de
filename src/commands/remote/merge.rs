use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::core::error::BruvError;
use crate::artifacts::merge_request::merge_request::MergeRequestId;
use crate::artifacts::objects::commit::Author;
use crate::artifacts::protocol::OK_REPLY;
use crate::artifacts::protocol::command_line::{CommandLine, MergeRequestLine, Verb};
use crate::artifacts::protocol::framing;
use crate::commands::remote::Connection;

const CREATED_PREFIX: &str = "Merge request created: ";

impl Repository {
    /// Ask a remote to merge `source` into the protected branch `target`
    pub async fn request_merge(
        &self,
        address: &str,
        remote_repository: &str,
        source: BranchName,
        target: BranchName,
    ) -> anyhow::Result<MergeRequestId> {
        let command = CommandLine::new(
            Verb::MergeRequest,
            remote_repository.to_string(),
            None,
            Vec::new(),
        );
        let mut connection = Connection::open(address, &command).await?;

        let reply = framing::expect_line(connection.reader()).await?;
        if reply != OK_REPLY {
            return Err(BruvError::WriteRejected(format!("unexpected reply '{reply}'")).into());
        }

        let requester = Author::load_from_env()?.name().to_string();
        let request = MergeRequestLine::new(source.clone(), target.clone(), Some(requester));
        framing::write_line(connection.writer(), &request.to_string()).await?;

        let reply = framing::expect_line(connection.reader()).await?;
        let id = reply
            .strip_prefix(CREATED_PREFIX)
            .map(MergeRequestId::try_parse)
            .transpose()?
            .ok_or_else(|| BruvError::WriteRejected(format!("unexpected reply '{reply}'")))?;

        writeln!(self.writer(), "Merge request submitted: {id} ({source} -> {target})")?;
        writeln!(self.writer(), "Waiting for repository owner approval...")?;

        Ok(id)
    }
}
