//! Staging policies read from the working-tree root
//!
//! - `ignore`: `.bruvignore` patterns for paths that are never staged
//! - `large_file`: `.bruvattributes` patterns for content kept out of blobs

pub mod ignore;
pub mod large_file;

/// Read the non-empty, non-comment lines of a policy file
///
/// A missing file yields no lines.
fn read_policy_lines(path: &std::path::Path) -> anyhow::Result<Vec<String>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}
