use crate::areas::refs::HEAD_REF_NAME;
use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::core::error::BruvError;
use crate::artifacts::objects::object_id::ObjectId;

impl Repository {
    /// Create `branch_name` at `source` (default: the current branch's commit)
    pub fn branch(&self, branch_name: &str, source: Option<&str>) -> anyhow::Result<()> {
        let branch_name = BranchName::try_parse(branch_name)?;

        let source_oid = match source {
            Some(source) => self.resolve_commit(source)?,
            None => self
                .refs()
                .read_head()?
                .ok_or_else(|| BruvError::InvalidRef("no current HEAD to branch from".into()))?,
        };

        self.refs().create_branch(&branch_name, &source_oid)?;

        Ok(())
    }

    /// Print every branch, marking the one HEAD names
    pub fn list_branches(&self) -> anyhow::Result<()> {
        let current = self.refs().current_branch()?;

        for branch in self.refs().list_branches()? {
            let marker = if branch == current { "*" } else { " " };
            writeln!(self.writer(), "{marker} {branch}")?;
        }

        Ok(())
    }

    /// Resolve `HEAD`, a branch name, or a full or abbreviated object id
    pub fn resolve_object(&self, revision: &str) -> anyhow::Result<ObjectId> {
        if revision == HEAD_REF_NAME {
            return self
                .refs()
                .read_head()?
                .ok_or_else(|| BruvError::InvalidRef("HEAD has no commits yet".into()).into());
        }

        if let Ok(branch) = BranchName::try_parse(revision)
            && self.refs().branch_exists(&branch)
        {
            return self
                .refs()
                .read_ref(&branch)?
                .ok_or_else(|| {
                    BruvError::InvalidRef(format!("branch {branch} has no commits yet")).into()
                });
        }

        self.expand_object_id(revision)
            .map_err(|_| BruvError::InvalidRef(format!("unknown revision '{revision}'")).into())
    }

    /// Like [`Repository::resolve_object`], but the result must be a commit
    pub fn resolve_commit(&self, revision: &str) -> anyhow::Result<ObjectId> {
        let oid = self.resolve_object(revision)?;
        self.database().load_commit(&oid)?;

        Ok(oid)
    }
}
