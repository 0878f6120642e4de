use assert_fs::TempDir;
use assert_fs::fixture::{FileWriteStr, PathChild};
use fake::Fake;
use fake::faker::lorem::en::Words;
use predicates::prelude::*;
use rstest::rstest;

mod common;
use common::command::{
    branch_commit_sha, bruv_commit, head_commit_sha, init_repository_dir, repository_dir,
    run_bruv_command,
};

#[rstest]
fn init_repository_successfully(repository_dir: TempDir) -> Result<(), Box<dyn std::error::Error>> {
    let dir_absolute_path = repository_dir.path().canonicalize()?.display().to_string();

    run_bruv_command(repository_dir.path(), &["init"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^Initialized empty bruv repository in .+\n$")?)
        .stdout(predicate::str::contains(dir_absolute_path));

    let head = std::fs::read_to_string(repository_dir.child(".bruv/HEAD").path())?;
    pretty_assertions::assert_eq!(head, "ref: refs/heads/main\n");
    assert!(repository_dir.child(".bruv/objects").path().is_dir());
    assert!(repository_dir.child(".bruv/refs/tags").path().is_dir());
    let config = std::fs::read_to_string(repository_dir.child(".bruv/config").path())?;
    assert!(config.starts_with("[core]"));

    run_bruv_command(repository_dir.path(), &["init"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Reinitialized existing bruv repository in"));

    Ok(())
}

#[rstest]
fn commands_outside_a_repository_fail(repository_dir: TempDir) {
    run_bruv_command(repository_dir.path(), &["log"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a bruv repository"));
}

#[rstest]
fn hash_object_prints_the_blob_id(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    run_bruv_command(repository_dir.path(), &["init"]).assert().success();
    repository_dir.child("hello.txt").write_str("hi")?;

    run_bruv_command(repository_dir.path(), &["hash-object", "hello.txt"])
        .assert()
        .success()
        .stdout("32f95c0d1244a78b2be1bab8de17906fabb2c4a8\n");
    assert!(!repository_dir.child(".bruv/objects/32").path().exists());

    run_bruv_command(repository_dir.path(), &["hash-object", "-w", "hello.txt"])
        .assert()
        .success();
    run_bruv_command(repository_dir.path(), &["cat-file", "32f95c0"])
        .assert()
        .success()
        .stdout("hi\n");
    run_bruv_command(repository_dir.path(), &["cat-file", "-t", "32f95c0d"])
        .assert()
        .success()
        .stdout("blob\n");

    Ok(())
}

#[rstest]
fn first_commit_is_reported_as_root(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    run_bruv_command(repository_dir.path(), &["init"]).assert().success();
    repository_dir.child("a.txt").write_str("hi")?;
    run_bruv_command(repository_dir.path(), &["add", "a.txt"]).assert().success();

    bruv_commit(repository_dir.path(), "first")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^\[main \(root-commit\) [0-9a-f]{7}\] first\n$")?);

    repository_dir.child("b.txt").write_str("more")?;
    run_bruv_command(repository_dir.path(), &["add", "b.txt"]).assert().success();
    bruv_commit(repository_dir.path(), "second")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^\[main [0-9a-f]{7}\] second\n$")?);

    Ok(())
}

#[rstest]
fn ls_tree_lists_the_head_tree(init_repository_dir: TempDir) {
    run_bruv_command(init_repository_dir.path(), &["ls-tree", "-r"])
        .assert()
        .success()
        .stdout(predicate::str::contains("100644 blob"))
        .stdout(predicate::str::contains("\t1.txt\n"))
        .stdout(predicate::str::contains("\ta/2.txt\n"))
        .stdout(predicate::str::contains("\ta/b/3.txt\n"));

    run_bruv_command(init_repository_dir.path(), &["ls-tree"])
        .assert()
        .success()
        .stdout(predicate::str::contains("40000 tree"))
        .stdout(predicate::str::contains("\ta\n"));
}

#[rstest]
fn log_shows_history_newest_first(
    init_repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    init_repository_dir.child("4.txt").write_str(&Words(3..6).fake::<Vec<String>>().join(" "))?;
    run_bruv_command(init_repository_dir.path(), &["add", "."]).assert().success();
    bruv_commit(init_repository_dir.path(), "Second commit").assert().success();
    let head = head_commit_sha(init_repository_dir.path())?;

    run_bruv_command(init_repository_dir.path(), &["log", "--oneline"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(format!(
            r"^{} Second commit\n[0-9a-f]{{7}} Initial commit\n$",
            &head[..7]
        ))?);

    run_bruv_command(init_repository_dir.path(), &["log"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(format!("commit {head}\n")))
        .stdout(predicate::str::contains("Author: fake_user <fake_email@email.com>"))
        .stdout(predicate::str::contains("Date:   Sun Jan 1 12:00:00 2023 +0000"))
        .stdout(predicate::str::contains("    Initial commit"));

    Ok(())
}

#[rstest]
fn branches_are_created_and_listed(
    init_repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    run_bruv_command(init_repository_dir.path(), &["branch", "feature"])
        .assert()
        .success();
    run_bruv_command(init_repository_dir.path(), &["branch", "feature"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
    run_bruv_command(init_repository_dir.path(), &["branch", "bad..name"])
        .assert()
        .failure();

    pretty_assertions::assert_eq!(
        branch_commit_sha(init_repository_dir.path(), "feature")?,
        head_commit_sha(init_repository_dir.path())?
    );

    run_bruv_command(init_repository_dir.path(), &["branch"])
        .assert()
        .success()
        .stdout("  feature\n* main\n");

    Ok(())
}

#[rstest]
fn missing_paths_warn_without_failing(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    run_bruv_command(repository_dir.path(), &["init"]).assert().success();
    repository_dir.child("a.txt").write_str("a")?;

    run_bruv_command(repository_dir.path(), &["add", "missing.txt", "a.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("warning:"))
        .stdout(predicate::str::contains("missing.txt"));

    Ok(())
}

#[rstest]
fn ignored_and_large_files_follow_their_policies(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    run_bruv_command(repository_dir.path(), &["init"]).assert().success();
    repository_dir.child(".bruvignore").write_str("# build output\ntarget/\n*.log\n")?;
    repository_dir.child(".bruvattributes").write_str("*.bin filter=lfs\n")?;
    repository_dir.child("keep.txt").write_str("keep")?;
    repository_dir.child("debug.log").write_str("noise")?;
    repository_dir.child("target/out.txt").write_str("built")?;
    repository_dir.child("model.bin").write_str("large payload")?;

    run_bruv_command(repository_dir.path(), &["add", "."]).assert().success();
    bruv_commit(repository_dir.path(), "policies").assert().success();

    run_bruv_command(repository_dir.path(), &["ls-tree", "-r"])
        .assert()
        .success()
        .stdout(predicate::str::contains("keep.txt"))
        .stdout(predicate::str::contains("model.bin"))
        .stdout(predicate::str::contains("debug.log").not())
        .stdout(predicate::str::contains("target/out.txt").not());

    // sha256("large payload") names the stored content
    let lfs_objects = walkdir::WalkDir::new(repository_dir.child(".bruv/lfs/objects").path())
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .collect::<Vec<_>>();
    pretty_assertions::assert_eq!(lfs_objects.len(), 1);
    pretty_assertions::assert_eq!(std::fs::read_to_string(lfs_objects[0].path())?, "large payload");

    Ok(())
}

#[rstest]
fn merge_requests_are_approved_from_the_cli(
    init_repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = init_repository_dir.path();
    run_bruv_command(dir, &["list-requests"])
        .assert()
        .success()
        .stdout("No merge requests found\n");

    let initial = head_commit_sha(dir)?;
    std::fs::write(dir.join("4.txt"), "feature work")?;
    run_bruv_command(dir, &["add", "4.txt"]).assert().success();
    bruv_commit(dir, "Feature commit").assert().success();
    let feature = head_commit_sha(dir)?;

    // move the feature commit onto its own branch and rewind main
    run_bruv_command(dir, &["branch", "feature"]).assert().success();
    std::fs::write(dir.join(".bruv/refs/heads/main"), format!("{initial}\n"))?;
    std::fs::write(
        dir.join(".bruv/merge-requests/mr-1.txt"),
        format!(
            "Source: feature\nTarget: main\nSourceHash: {feature}\nTargetHash: {initial}\n\
             Status: pending\nTimestamp: 1672574400\nRequester: alice\n"
        ),
    )?;

    run_bruv_command(dir, &["list-requests"])
        .assert()
        .success()
        .stdout(predicate::str::contains("MR-1: feature -> main [pending]"))
        .stdout(predicate::str::contains("Summary: 1 pending, 0 approved, 0 rejected"));

    run_bruv_command(dir, &["approve", "MR-1", "--by", "owner"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Merge request MR-1 approved"));
    run_bruv_command(dir, &["approve", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already approved"));
    run_bruv_command(dir, &["reject", "MR-2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));

    run_bruv_command(dir, &["list-requests"])
        .assert()
        .success()
        .stdout(predicate::str::contains("MR-1: feature -> main [approved]"))
        .stdout(predicate::str::contains("Approved by: owner"));
    pretty_assertions::assert_eq!(branch_commit_sha(dir, "main")?, feature);

    Ok(())
}
