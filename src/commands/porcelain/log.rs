use crate::areas::repository::Repository;
use crate::artifacts::log::rev_list::RevList;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;

impl Repository {
    /// Show history from `revision` (default: the current branch)
    pub fn log(&self, revision: Option<&str>, oneline: bool) -> anyhow::Result<()> {
        let start = match revision {
            Some(revision) => Some(self.resolve_commit(revision)?),
            None => self.refs().read_head()?,
        };

        for (index, entry) in RevList::new(self.database(), start).into_iter().enumerate() {
            let (commit_id, commit) = entry?;

            if oneline {
                self.show_commit_oneline(&commit_id, &commit)?;
            } else {
                if index > 0 {
                    writeln!(self.writer())?;
                }
                self.show_commit_medium(&commit_id, &commit)?;
            }
        }

        Ok(())
    }

    fn show_commit_medium(&self, commit_id: &ObjectId, commit: &Commit) -> anyhow::Result<()> {
        writeln!(self.writer(), "commit {commit_id}")?;
        writeln!(self.writer(), "Author: {}", commit.author().display_name())?;
        writeln!(self.writer(), "Date:   {}", commit.author().readable_timestamp())?;
        writeln!(self.writer())?;
        for message_line in commit.message().lines() {
            writeln!(self.writer(), "    {message_line}")?;
        }

        Ok(())
    }

    fn show_commit_oneline(&self, commit_id: &ObjectId, commit: &Commit) -> anyhow::Result<()> {
        writeln!(
            self.writer(),
            "{} {}",
            commit_id.to_short_oid(),
            commit.short_message()
        )?;

        Ok(())
    }
}
