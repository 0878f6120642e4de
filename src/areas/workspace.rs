use crate::areas::repository::MARKER_DIR;
use crate::artifacts::core::error::BruvError;
use crate::artifacts::index::index_entry::EntryMetadata;
use anyhow::Context;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// The working tree: the directory that holds the marker directory
#[derive(Debug)]
pub struct Workspace {
    path: Box<Path>,
}

impl Workspace {
    pub fn new(path: Box<Path>) -> Self {
        Workspace { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Expand a path into the files under it, relative to the working tree
    ///
    /// Relative arguments are resolved against the working-tree root.
    pub fn list_files(&self, root_file_path: &Path) -> anyhow::Result<Vec<PathBuf>> {
        let root_file_path = self.path.join(root_file_path);
        let root_file_path = root_file_path.canonicalize().map_err(|_| {
            BruvError::NotFound(format!(
                "pathspec '{}' did not match any files",
                root_file_path.display()
            ))
        })?;

        if !root_file_path.starts_with(&self.path) {
            return Err(BruvError::NotFound(format!(
                "'{}' is outside the repository",
                root_file_path.display()
            ))
            .into());
        }

        if root_file_path.is_dir() {
            let mut files = WalkDir::new(&root_file_path)
                .into_iter()
                .filter_entry(|entry| entry.file_name() != MARKER_DIR)
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file())
                .filter_map(|entry| self.relative_path(entry.path()))
                .collect::<Vec<_>>();
            files.sort();

            Ok(files)
        } else {
            Ok(self.relative_path(&root_file_path).into_iter().collect())
        }
    }

    fn relative_path(&self, path: &Path) -> Option<PathBuf> {
        path.strip_prefix(self.path.as_ref()).ok().map(PathBuf::from)
    }

    pub fn read_file(&self, file_path: &Path) -> anyhow::Result<Bytes> {
        let file_path = self.path.join(file_path);

        let content = std::fs::read(&file_path)
            .with_context(|| format!("reading {}", file_path.display()))?;

        Ok(content.into())
    }

    pub fn stat_file(&self, file_path: &Path) -> anyhow::Result<EntryMetadata> {
        let metadata = std::fs::metadata(self.path.join(file_path))?;

        (file_path, metadata).try_into()
    }
}
