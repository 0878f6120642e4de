//! References (branches and HEAD)
//!
//! Branches are files under `refs/heads/` holding a 40-character hex commit
//! id and a newline. HEAD is always symbolic: `ref: refs/heads/<name>`.
//! A branch file that is absent or empty means the branch has no commits yet.

use crate::artifacts::branch::branch_name::{BranchName, SymRefName};
use crate::artifacts::core::error::BruvError;
use crate::artifacts::objects::object_id::ObjectId;
use anyhow::Context;
use derive_new::new;
use file_guard::Lock;
use std::io::Write;
use std::ops::DerefMut;
use std::path::Path;
use walkdir::WalkDir;

#[derive(Debug, new)]
pub struct Refs {
    /// Path to the repository marker directory
    path: Box<Path>,
}

/// Name of the HEAD reference
pub const HEAD_REF_NAME: &str = "HEAD";

impl Refs {
    /// The ref HEAD points at, e.g. `refs/heads/main`
    pub fn current_ref(&self) -> anyhow::Result<SymRefName> {
        let head_path = self.head_path();
        let content = std::fs::read_to_string(&head_path)
            .map_err(|_| BruvError::InvalidRef(format!("cannot read {}", head_path.display())))?;

        SymRefName::try_parse_head(&content)
    }

    pub fn current_branch(&self) -> anyhow::Result<BranchName> {
        BranchName::try_parse_sym_ref_name(&self.current_ref()?)
    }

    /// Commit the current branch points at, if it has one
    pub fn read_head(&self) -> anyhow::Result<Option<ObjectId>> {
        self.read_ref(&self.current_branch()?)
    }

    /// Advance the branch HEAD points at
    pub fn update_head(&self, oid: &ObjectId) -> anyhow::Result<()> {
        self.update_ref(&self.current_branch()?, oid)
    }

    /// Point HEAD at a branch (which need not have commits yet)
    pub fn set_head(&self, branch_name: &BranchName) -> anyhow::Result<()> {
        self.write_ref_file(&self.head_path(), &SymRefName::from(branch_name).to_head_line())
    }

    pub fn read_ref(&self, branch_name: &BranchName) -> anyhow::Result<Option<ObjectId>> {
        let ref_path = self.branch_path(branch_name);
        if !ref_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&ref_path)
            .with_context(|| format!("failed to read ref file at {}", ref_path.display()))?;
        let content = content.trim();

        if content.is_empty() {
            return Ok(None);
        }

        ObjectId::try_parse(content.to_string())
            .map(Some)
            .map_err(|_| BruvError::InvalidRef(format!("{branch_name} holds '{content}'")).into())
    }

    /// Unconditionally overwrite a branch
    pub fn update_ref(&self, branch_name: &BranchName, oid: &ObjectId) -> anyhow::Result<()> {
        self.write_ref_file(&self.branch_path(branch_name), &format!("{oid}\n"))
    }

    pub fn branch_exists(&self, branch_name: &BranchName) -> bool {
        self.branch_path(branch_name).is_file()
    }

    pub fn create_branch(&self, name: &BranchName, source_oid: &ObjectId) -> anyhow::Result<()> {
        if self.branch_exists(name) {
            return Err(BruvError::InvalidRef(format!("branch {name} already exists")).into());
        }

        self.update_ref(name, source_oid)
    }

    /// All branches, sorted by name
    pub fn list_branches(&self) -> anyhow::Result<Vec<BranchName>> {
        let heads_path = self.heads_path();
        let mut branches = WalkDir::new(&heads_path)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                let relative_path = entry.path().strip_prefix(&heads_path).ok()?;
                BranchName::try_parse(relative_path.to_string_lossy().to_string()).ok()
            })
            .collect::<Vec<_>>();
        branches.sort();

        Ok(branches)
    }

    fn write_ref_file(&self, path: &Path, raw_ref: &str) -> anyhow::Result<()> {
        std::fs::create_dir_all(path.parent().with_context(|| {
            format!("failed to create parent directories for ref file at {path:?}")
        })?)?;

        let mut ref_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .with_context(|| format!("failed to open ref file at {path:?}"))?;
        let mut lock = file_guard::lock(&mut ref_file, Lock::Exclusive, 0, 1)?;
        lock.deref_mut().write_all(raw_ref.as_bytes())?;

        Ok(())
    }

    fn branch_path(&self, branch_name: &BranchName) -> Box<Path> {
        self.heads_path().join(branch_name.as_ref()).into_boxed_path()
    }

    pub fn head_path(&self) -> Box<Path> {
        self.path.join(HEAD_REF_NAME).into_boxed_path()
    }

    pub fn refs_path(&self) -> Box<Path> {
        self.path.join("refs").into_boxed_path()
    }

    pub fn heads_path(&self) -> Box<Path> {
        self.refs_path().join("heads").into_boxed_path()
    }

    pub fn tags_path(&self) -> Box<Path> {
        self.refs_path().join("tags").into_boxed_path()
    }
}
