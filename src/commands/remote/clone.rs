use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::protocol::command_line::{CommandLine, Verb};
use std::path::PathBuf;

impl Repository {
    /// Initialise this repository from a remote branch
    ///
    /// The fetched branch becomes the current branch. With `select`, only the
    /// trees and blobs on the way to the selected paths are transferred.
    pub async fn clone_from_remote(
        &self,
        address: &str,
        remote_repository: &str,
        branch: Option<BranchName>,
        select: Vec<PathBuf>,
    ) -> anyhow::Result<()> {
        self.init().await?;

        let command =
            CommandLine::new(Verb::UploadPack, remote_repository.to_string(), branch, select);
        let ref_line = self.fetch(address, &command).await?;

        self.refs().update_ref(&ref_line.branch, &ref_line.oid)?;
        self.refs().set_head(&ref_line.branch)?;

        writeln!(
            self.writer(),
            "Cloned {remote_repository} into {} ({} at {})",
            self.path().display(),
            ref_line.branch,
            ref_line.oid.to_short_oid()
        )?;

        Ok(())
    }
}
