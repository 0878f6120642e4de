use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::core::error::BruvError;
use crate::artifacts::pack::collector::ObjectCollector;
use crate::artifacts::pack::pack_file::PackEncoder;
use crate::artifacts::protocol::OK_REPLY;
use crate::artifacts::protocol::command_line::{CommandLine, RefLine, Verb};
use crate::artifacts::protocol::framing;
use crate::commands::remote::Connection;

impl Repository {
    /// Send a branch to a remote; protected branches are refused there
    pub async fn push(
        &self,
        address: &str,
        remote_repository: &str,
        branch: BranchName,
    ) -> anyhow::Result<()> {
        let tip = self
            .refs()
            .read_ref(&branch)?
            .ok_or_else(|| {
                BruvError::NotFound(format!("branch '{branch}' has no commits to push"))
            })?;

        let command = CommandLine::new(
            Verb::ReceivePack,
            remote_repository.to_string(),
            Some(branch.clone()),
            Vec::new(),
        );
        let mut connection = Connection::open(address, &command).await?;

        let reply = framing::expect_line(connection.reader())
            .await
            .map_err(|err| BruvError::WriteRejected(err.to_string()))?;
        if reply != OK_REPLY {
            return Err(BruvError::WriteRejected(format!("unexpected reply '{reply}'")).into());
        }

        let objects = ObjectCollector::new(self.database()).collect(&tip)?;
        let pack = PackEncoder::new(self.database()).encode(&objects)?;

        let ref_line = RefLine::new(tip.clone(), branch.clone());
        framing::write_line(connection.writer(), &ref_line.to_string()).await?;
        framing::write_pack(connection.writer(), &pack).await?;

        let reply = framing::expect_line(connection.reader())
            .await
            .map_err(|err| BruvError::WriteRejected(err.to_string()))?;
        if reply != format!("{OK_REPLY} {tip}") {
            return Err(BruvError::WriteRejected(format!("unexpected reply '{reply}'")).into());
        }

        tracing::info!(branch = %branch, objects = objects.len(), "pushed branch");
        writeln!(self.writer(), "To {remote_repository}")?;
        writeln!(self.writer(), "   {branch} -> {}", tip.to_short_oid())?;

        Ok(())
    }
}
