use crate::areas::repository::Repository;
use crate::artifacts::branch::DEFAULT_BRANCH;
use crate::artifacts::branch::branch_name::BranchName;
use anyhow::Context;
use std::fs;

const DEFAULT_CONFIG: &str = "[core]\n\trepositoryformatversion = 0\n\tbare = false\n";

impl Repository {
    pub async fn init(&self) -> anyhow::Result<()> {
        let reinitialized = self.refs().head_path().exists();

        fs::create_dir_all(self.database().objects_path())
            .context("Failed to create .bruv/objects directory")?;
        fs::create_dir_all(self.refs().heads_path())
            .context("Failed to create .bruv/refs/heads directory")?;
        fs::create_dir_all(self.refs().tags_path())
            .context("Failed to create .bruv/refs/tags directory")?;
        fs::create_dir_all(self.merge_requests().path())
            .context("Failed to create .bruv/merge-requests directory")?;

        if !reinitialized {
            self.refs()
                .set_head(&BranchName::try_parse(DEFAULT_BRANCH)?)
                .context("Failed to create initial HEAD reference")?;
        }

        let config_path = self.config_path();
        if !config_path.exists() {
            fs::write(&config_path, DEFAULT_CONFIG).context("Failed to create .bruv/config")?;
        }

        let verb = if reinitialized { "Reinitialized existing" } else { "Initialized empty" };
        writeln!(
            self.writer(),
            "{verb} bruv repository in {}",
            self.marker_path().display()
        )?;

        Ok(())
    }
}
