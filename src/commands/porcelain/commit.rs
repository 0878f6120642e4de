use crate::areas::repository::Repository;
use crate::artifacts::objects::object_id::ObjectId;

impl Repository {
    pub async fn commit(&self, message: &str) -> anyhow::Result<ObjectId> {
        let tree_id = self.write_tree().await?;

        let branch = self.refs().current_branch()?;
        let message = message.trim().to_string();
        let (commit_id, commit) = self.write_commit(tree_id, message)?;

        let is_root = match commit.parent() {
            Some(_) => "",
            None => " (root-commit)",
        };

        writeln!(
            self.writer(),
            "[{}{} {}] {}",
            branch,
            is_root,
            commit_id.to_short_oid(),
            commit.short_message()
        )?;

        Ok(commit_id)
    }
}
