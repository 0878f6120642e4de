use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::core::error::BruvError;
use crate::artifacts::protocol::command_line::{CommandLine, Verb};
use std::path::PathBuf;

impl Repository {
    /// Fast-forward a local branch (default: the current one) from a remote
    pub async fn pull(
        &self,
        address: &str,
        remote_repository: &str,
        branch: Option<BranchName>,
        select: Vec<PathBuf>,
    ) -> anyhow::Result<()> {
        let branch = match branch {
            Some(branch) => branch,
            None => self.refs().current_branch()?,
        };
        let local = self.refs().read_ref(&branch)?;

        let command = CommandLine::new(
            Verb::UploadPack,
            remote_repository.to_string(),
            Some(branch.clone()),
            select,
        );
        let ref_line = self.fetch(address, &command).await?;

        if local.as_ref() == Some(&ref_line.oid) {
            writeln!(self.writer(), "Already up to date.")?;
            return Ok(());
        }

        if let Some(local) = &local
            && !self.database().is_ancestor(local, &ref_line.oid)?
        {
            return Err(BruvError::Conflict(format!(
                "{branch} has diverged from {remote_repository}; refusing a non-fast-forward pull"
            ))
            .into());
        }

        self.refs().update_ref(&branch, &ref_line.oid)?;

        writeln!(
            self.writer(),
            "Updated {branch}: {}..{}",
            local.map(|oid| oid.to_short_oid()).unwrap_or_else(|| "0000000".to_string()),
            ref_line.oid.to_short_oid()
        )?;

        Ok(())
    }
}
