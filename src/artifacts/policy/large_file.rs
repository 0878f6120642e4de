//! Large-file pointers
//!
//! Paths matched by a `<glob> filter=lfs` line in `.bruvattributes` are
//! staged as a small pointer record. The real bytes are kept under
//! `lfs/objects/<2>/<2>/<rest>` in the marker directory, keyed by SHA-256.

use crate::artifacts::core::glob::Glob;
use crate::artifacts::policy::read_policy_lines;
use anyhow::Context;
use derive_new::new;
use sha2::{Digest, Sha256};
use std::path::Path;

pub const ATTRIBUTES_FILE: &str = ".bruvattributes";

const LFS_FILTER: &str = "filter=lfs";
const POINTER_VERSION: &str = "version https://git-lfs.github.com/spec/v1";

#[derive(Debug, Clone, Default)]
pub struct LargeFilePolicy {
    patterns: Vec<Glob>,
}

impl LargeFilePolicy {
    pub fn load(worktree: &Path) -> anyhow::Result<Self> {
        let path = worktree.join(ATTRIBUTES_FILE);
        let patterns = read_policy_lines(&path)
            .with_context(|| format!("reading {}", path.display()))?
            .iter()
            .filter_map(|line| {
                let mut fields = line.split_whitespace();
                match (fields.next(), fields.next()) {
                    (Some(pattern), Some(LFS_FILTER)) => Some(Glob::try_parse(pattern)),
                    _ => None,
                }
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(LargeFilePolicy { patterns })
    }

    /// Whether a path relative to the working-tree root goes through the pointer store
    pub fn is_large_file(&self, path: &Path) -> bool {
        let full_path = path.to_string_lossy();
        let basename = path
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_default();

        self.patterns
            .iter()
            .any(|pattern| pattern.is_match(&full_path) || pattern.is_match(&basename))
    }
}

/// Pointer record stored in place of large content
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct Pointer {
    pub oid: String,
    pub size: u64,
}

impl Pointer {
    pub fn for_content(content: &[u8]) -> Self {
        Pointer::new(format!("{:x}", Sha256::digest(content)), content.len() as u64)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        format!("{POINTER_VERSION}\noid sha256:{}\nsize {}\n", self.oid, self.size).into_bytes()
    }

    /// Recognise a pointer record; anything else is ordinary content
    pub fn parse(content: &[u8]) -> Option<Self> {
        let content = std::str::from_utf8(content).ok()?;
        let mut lines = content.lines();

        if lines.next()? != POINTER_VERSION {
            return None;
        }
        let oid = lines.next()?.strip_prefix("oid sha256:")?.to_string();
        let size = lines.next()?.strip_prefix("size ")?.parse().ok()?;

        Some(Pointer { oid, size })
    }
}

/// Content store for large files
#[derive(Debug, new)]
pub struct LargeFileStore {
    /// `lfs/objects` inside the marker directory
    path: Box<Path>,
}

impl LargeFileStore {
    /// Keep the content in the store and return the pointer that replaces it
    pub fn store(&self, content: &[u8]) -> anyhow::Result<Pointer> {
        let pointer = Pointer::for_content(content);
        let object_path = self.object_path(&pointer);

        if !object_path.exists() {
            let object_dir = object_path
                .parent()
                .with_context(|| format!("invalid large file path {}", object_path.display()))?;
            std::fs::create_dir_all(object_dir)?;
            std::fs::write(&object_path, content)
                .with_context(|| format!("writing large file {}", object_path.display()))?;
        }

        Ok(pointer)
    }

    pub fn object_path(&self, pointer: &Pointer) -> std::path::PathBuf {
        self.path
            .join(&pointer.oid[..2])
            .join(&pointer.oid[2..4])
            .join(&pointer.oid[4..])
    }
}
