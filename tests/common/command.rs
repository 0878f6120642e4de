use crate::common::file::{FileSpec, write_file};
use crate::common::redirect_temp_dir;
use assert_cmd::Command;
use assert_fs::TempDir;
use rstest::fixture;
use std::path::Path;

#[fixture]
pub fn repository_dir() -> TempDir {
    redirect_temp_dir();
    TempDir::new().expect("Failed to create temp dir")
}

#[fixture]
pub fn init_repository_dir(repository_dir: TempDir) -> TempDir {
    run_bruv_command(repository_dir.path(), &["init"])
        .assert()
        .success();

    write_file(FileSpec::new(repository_dir.path().join("1.txt"), "one".to_string()));
    write_file(FileSpec::new(
        repository_dir.path().join("a").join("2.txt"),
        "two".to_string(),
    ));
    write_file(FileSpec::new(
        repository_dir.path().join("a").join("b").join("3.txt"),
        "three".to_string(),
    ));

    run_bruv_command(repository_dir.path(), &["add", "."])
        .assert()
        .success();

    bruv_commit(repository_dir.path(), "Initial commit")
        .assert()
        .success();

    repository_dir
}

pub fn run_bruv_command(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::cargo_bin("bruv").expect("Failed to find bruv binary");
    cmd.env("RUST_LOG", "error");
    cmd.current_dir(dir);
    for arg in args {
        cmd.arg(arg);
    }
    cmd
}

pub fn bruv_commit(dir: &Path, message: &str) -> Command {
    let mut cmd = run_bruv_command(dir, &["commit", "-m", message]);
    cmd.envs(vec![
        ("BRUV_AUTHOR_NAME", "fake_user"),
        ("BRUV_AUTHOR_EMAIL", "fake_email@email.com"),
        ("BRUV_AUTHOR_DATE", "2023-01-01 12:00:00 +0000"), // %Y-%m-%d %H:%M:%S %z
    ]);
    cmd
}

/// The commit a branch points at, read straight from the ref file
pub fn branch_commit_sha(dir: &Path, branch: &str) -> Result<String, Box<dyn std::error::Error>> {
    let ref_file = dir.join(".bruv").join("refs").join("heads").join(branch);
    Ok(std::fs::read_to_string(ref_file)?.trim().to_string())
}

/// The commit HEAD resolves to
pub fn head_commit_sha(dir: &Path) -> Result<String, Box<dyn std::error::Error>> {
    let head_content = std::fs::read_to_string(dir.join(".bruv").join("HEAD"))?;
    let branch = head_content
        .trim()
        .strip_prefix("ref: refs/heads/")
        .ok_or("HEAD is not symbolic")?;

    branch_commit_sha(dir, branch)
}
