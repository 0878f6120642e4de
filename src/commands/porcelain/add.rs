use crate::areas::repository::Repository;
use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::policy::ignore::IgnorePolicy;
use crate::artifacts::policy::large_file::LargeFilePolicy;
use std::path::Path;

impl Repository {
    /// Stage files; directories expand to every file under them
    ///
    /// A path that cannot be staged is reported as a warning and the
    /// remaining paths are still staged.
    pub async fn add(&self, paths: &[String]) -> anyhow::Result<()> {
        let ignore_policy = IgnorePolicy::load(self.workspace().path())?;
        let large_file_policy = LargeFilePolicy::load(self.workspace().path())?;

        let index = self.index();
        let mut index = index.lock().await;

        // Load the index file from the disk
        index.rehydrate()?;

        for path in paths {
            let files = match self.workspace().list_files(Path::new(path)) {
                Ok(files) => files,
                Err(err) => {
                    tracing::warn!(path = %path, "skipping unstageable path");
                    writeln!(self.writer(), "warning: {err}")?;
                    continue;
                }
            };

            for file in files.iter().filter(|file| !ignore_policy.is_ignored(file)) {
                match self.stage_file(file, &large_file_policy) {
                    Ok(entry) => index.add(entry),
                    Err(err) => {
                        tracing::warn!(path = %file.display(), "skipping unreadable file");
                        writeln!(self.writer(), "warning: {err:#}")?;
                    }
                }
            }
        }

        index.write_updates()?;

        Ok(())
    }

    fn stage_file(
        &self,
        file: &Path,
        large_file_policy: &LargeFilePolicy,
    ) -> anyhow::Result<IndexEntry> {
        let content = self.workspace().read_file(file)?;
        let stat = self.workspace().stat_file(file)?;

        let blob_id = self.store_blob(file, &content, large_file_policy)?;

        Ok(IndexEntry::new(file.to_path_buf(), blob_id, stat))
    }

    fn store_blob(
        &self,
        file: &Path,
        content: &[u8],
        large_file_policy: &LargeFilePolicy,
    ) -> anyhow::Result<ObjectId> {
        if large_file_policy.is_large_file(file) {
            let pointer = self.large_files().store(content)?;
            tracing::debug!(path = %file.display(), oid = %pointer.oid, "stored large file");

            return self.database().put(ObjectType::Blob, &pointer.to_bytes());
        }

        self.database().put(ObjectType::Blob, content)
    }
}
