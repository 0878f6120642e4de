use crate::areas::database::Database;
use crate::areas::index::Index;
use crate::areas::merge_requests::MergeRequests;
use crate::areas::refs::Refs;
use crate::areas::workspace::Workspace;
use crate::artifacts::core::error::BruvError;
use crate::artifacts::policy::large_file::LargeFileStore;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, MutexGuard, PoisonError};
use tokio::sync::Mutex;

/// Name of the repository marker directory inside the working tree
pub const MARKER_DIR: &str = ".bruv";

type Writer = Box<dyn Write + Send>;

/// Handle on one repository: its working tree and everything under `.bruv`
///
/// Every command takes the handle explicitly; nothing is looked up through
/// process-wide state, so one process may serve many repositories.
pub struct Repository {
    path: Box<Path>,
    writer: std::sync::Mutex<Writer>,
    index: Arc<Mutex<Index>>,
    database: Database,
    workspace: Workspace,
    refs: Refs,
    merge_requests: MergeRequests,
}

impl Repository {
    /// Handle on `path` without checking that a repository exists there
    pub fn new(path: &Path, writer: Writer) -> anyhow::Result<Self> {
        if !path.exists() {
            std::fs::create_dir_all(path)?;
        }
        let path = path.canonicalize()?;
        let marker = path.join(MARKER_DIR);

        Ok(Repository {
            writer: std::sync::Mutex::new(writer),
            index: Arc::new(Mutex::new(Index::new(marker.join("index").into_boxed_path()))),
            database: Database::new(marker.join("objects").into_boxed_path()),
            workspace: Workspace::new(path.clone().into_boxed_path()),
            refs: Refs::new(marker.clone().into_boxed_path()),
            merge_requests: MergeRequests::new(marker.join("merge-requests").into_boxed_path()),
            path: path.into_boxed_path(),
        })
    }

    /// Handle on an existing repository rooted exactly at `path`
    pub fn open(path: &Path, writer: Writer) -> anyhow::Result<Self> {
        if !path.join(MARKER_DIR).join("HEAD").is_file() {
            return Err(BruvError::NotARepository(path.display().to_string()).into());
        }

        Self::new(path, writer)
    }

    /// Handle on the repository containing `start`, searching parent directories
    pub fn discover(start: &Path, writer: Writer) -> anyhow::Result<Self> {
        let start = start
            .canonicalize()
            .map_err(|_| BruvError::NotARepository(start.display().to_string()))?;

        let root = start
            .ancestors()
            .find(|dir| dir.join(MARKER_DIR).join("HEAD").is_file())
            .ok_or_else(|| BruvError::NotARepository(start.display().to_string()))?;

        Self::new(root, writer)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn marker_path(&self) -> Box<Path> {
        self.path.join(MARKER_DIR).into_boxed_path()
    }

    pub fn writer(&self) -> MutexGuard<'_, Writer> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn index(&self) -> Arc<Mutex<Index>> {
        self.index.clone()
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn refs(&self) -> &Refs {
        &self.refs
    }

    pub fn merge_requests(&self) -> &MergeRequests {
        &self.merge_requests
    }

    pub fn large_files(&self) -> LargeFileStore {
        LargeFileStore::new(self.marker_path().join("lfs").join("objects").into_boxed_path())
    }

    pub fn config_path(&self) -> Box<Path> {
        self.marker_path().join("config").into_boxed_path()
    }
}
