//! Merge-request store
//!
//! One text file per request under `.bruv/merge-requests/`. Ids are allocated
//! by exclusive-create of the next file name, so two concurrent submissions
//! never share an id.

use crate::artifacts::core::error::BruvError;
use crate::artifacts::merge_request::merge_request::{MergeRequest, MergeRequestId};
use crate::artifacts::objects::object::{Packable, Unpackable};
use anyhow::Context;
use derive_new::new;
use std::io::Write;
use std::path::{Path, PathBuf};

const MAX_ALLOCATION_ATTEMPTS: usize = 64;

#[derive(Debug, new)]
pub struct MergeRequests {
    path: Box<Path>,
}

impl MergeRequests {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist a new request under a fresh id and return it with that id
    pub fn create(&self, merge_request: MergeRequest) -> anyhow::Result<MergeRequest> {
        std::fs::create_dir_all(&self.path)
            .with_context(|| format!("creating {}", self.path.display()))?;

        for _ in 0..MAX_ALLOCATION_ATTEMPTS {
            let id = self.next_id()?;
            let merge_request = merge_request.clone().with_id(id);

            let file = std::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(self.request_path(id));

            match file {
                Ok(mut file) => {
                    file.write_all(&merge_request.serialize()?)?;
                    return Ok(merge_request);
                }
                Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(err) => return Err(err.into()),
            }
        }

        Err(BruvError::Conflict("could not allocate a merge request id".into()).into())
    }

    pub fn load(&self, id: MergeRequestId) -> anyhow::Result<MergeRequest> {
        let content = std::fs::read(self.request_path(id))
            .map_err(|_| BruvError::NotFound(format!("merge request {id} does not exist")))?;

        Ok(MergeRequest::deserialize(content.as_slice())
            .with_context(|| format!("reading merge request {id}"))?
            .with_id(id))
    }

    /// Rewrite the whole request file
    pub fn save(&self, merge_request: &MergeRequest) -> anyhow::Result<()> {
        let request_path = self.request_path(merge_request.id());
        std::fs::write(&request_path, merge_request.serialize()?)
            .with_context(|| format!("writing {}", request_path.display()))?;

        Ok(())
    }

    /// Every request, ordered by id
    pub fn list(&self) -> anyhow::Result<Vec<MergeRequest>> {
        let mut ids = self.ids()?;
        ids.sort();

        ids.into_iter().map(|id| self.load(id)).collect()
    }

    fn ids(&self) -> anyhow::Result<Vec<MergeRequestId>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        for entry in std::fs::read_dir(&self.path)? {
            let entry = entry?;
            if let Some(id) = entry.file_name().to_str().and_then(MergeRequestId::from_file_name) {
                ids.push(id);
            }
        }

        Ok(ids)
    }

    fn next_id(&self) -> anyhow::Result<MergeRequestId> {
        match self.ids()?.into_iter().max() {
            Some(id) => id.next(),
            None => Ok(MergeRequestId::new(1)),
        }
    }

    fn request_path(&self, id: MergeRequestId) -> PathBuf {
        self.path.join(id.file_name())
    }
}
