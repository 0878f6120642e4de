use crate::artifacts::core::glob::Glob;
use crate::artifacts::policy::read_policy_lines;
use crate::areas::repository::MARKER_DIR;
use anyhow::Context;
use std::path::{Component, Path};

pub const IGNORE_FILE: &str = ".bruvignore";

/// Paths excluded from staging
#[derive(Debug, Clone, Default)]
pub struct IgnorePolicy {
    patterns: Vec<Glob>,
}

impl IgnorePolicy {
    pub fn load(worktree: &Path) -> anyhow::Result<Self> {
        let path = worktree.join(IGNORE_FILE);
        let patterns = read_policy_lines(&path)
            .with_context(|| format!("reading {}", path.display()))?
            .iter()
            .map(|line| Glob::try_parse(line.trim_end_matches('/')))
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(IgnorePolicy { patterns })
    }

    pub fn from_patterns(patterns: &[&str]) -> anyhow::Result<Self> {
        let patterns = patterns
            .iter()
            .map(|pattern| Glob::try_parse(pattern))
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(IgnorePolicy { patterns })
    }

    /// Whether a path relative to the working-tree root is ignored
    ///
    /// A pattern matches the basename, the whole path, or any directory the
    /// path lives under. The marker directory is always ignored.
    pub fn is_ignored(&self, path: &Path) -> bool {
        let components = path
            .components()
            .filter_map(|component| match component {
                Component::Normal(name) => Some(name.to_string_lossy().to_string()),
                _ => None,
            })
            .collect::<Vec<_>>();

        if components.first().is_some_and(|first| first == MARKER_DIR) {
            return true;
        }

        let Some((basename, dirs)) = components.split_last() else {
            return false;
        };
        let full_path = components.join("/");

        self.patterns.iter().any(|pattern| {
            pattern.is_match(basename)
                || pattern.is_match(&full_path)
                || dirs.iter().any(|dir| pattern.is_match(dir))
        })
    }
}
