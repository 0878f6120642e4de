use assert_fs::TempDir;
use bruv::areas::database::Database;
use bruv::areas::repository::Repository;
use bruv::artifacts::branch::branch_name::BranchName;
use bruv::artifacts::core::error::BruvError;
use bruv::artifacts::merge_request::status::Status;
use bruv::artifacts::objects::object_id::ObjectId;
use bruv::artifacts::objects::object_type::ObjectType;
use bruv::artifacts::pack::pack_file::PackEncoder;
use sha1::{Digest, Sha1};
use std::collections::BTreeSet;
use pretty_assertions::assert_eq;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

mod common;
use common::repository::{commit_files, init_repository, start_server};

fn branch(name: &str) -> BranchName {
    BranchName::try_parse(name).unwrap()
}

/// A served root holding `origin` with one commit on main
async fn served_origin() -> (TempDir, Repository, SocketAddr, ObjectId) {
    let root = TempDir::new().unwrap();
    let origin = init_repository(&root.path().join("origin")).await;
    let files = [("a.txt", "hi"), ("docs/guide.md", "read me")];
    let tip = commit_files(&origin, &files, "first").await;
    let address = start_server(root.path()).await;

    (root, origin, address, tip)
}

/// Send raw lines and collect every reply line until the server hangs up
async fn exchange(address: SocketAddr, lines: &[&str]) -> Vec<String> {
    let stream = TcpStream::connect(address).await.unwrap();
    let (reader, mut writer) = stream.into_split();
    for line in lines {
        writer.write_all(format!("{line}\n").as_bytes()).await.unwrap();
    }
    writer.shutdown().await.unwrap();

    let mut replies = Vec::new();
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        replies.push(line);
    }

    replies
}

#[tokio::test]
async fn clone_copies_the_branch_history() {
    let (_root, _origin, address, tip) = served_origin().await;
    let clone_dir = TempDir::new().unwrap();
    let clone = Repository::new(clone_dir.path(), Box::new(std::io::sink())).unwrap();

    clone
        .clone_from_remote(&address.to_string(), "origin", None, Vec::new())
        .await
        .unwrap();

    assert_eq!(clone.refs().read_ref(&branch("main")).unwrap(), Some(tip.clone()));
    assert_eq!(clone.refs().current_branch().unwrap(), branch("main"));
    assert!(clone.database().exists(&ObjectId::for_content(ObjectType::Blob, b"hi")));
    assert!(clone.database().exists(&ObjectId::for_content(ObjectType::Blob, b"read me")));
}

#[tokio::test]
async fn selective_clone_skips_unselected_blobs() {
    let (_root, _origin, address, tip) = served_origin().await;
    let clone_dir = TempDir::new().unwrap();
    let clone = Repository::new(clone_dir.path(), Box::new(std::io::sink())).unwrap();

    clone
        .clone_from_remote(&address.to_string(), "origin", None, vec![PathBuf::from("docs")])
        .await
        .unwrap();

    assert!(clone.database().exists(&tip));
    assert!(clone.database().exists(&ObjectId::for_content(ObjectType::Blob, b"read me")));
    assert!(!clone.database().exists(&ObjectId::for_content(ObjectType::Blob, b"hi")));
}

#[tokio::test]
async fn pushing_main_is_rejected_and_main_is_unchanged() {
    let (_root, origin, address, tip) = served_origin().await;
    let clone_dir = TempDir::new().unwrap();
    let clone = Repository::new(clone_dir.path(), Box::new(std::io::sink())).unwrap();
    clone
        .clone_from_remote(&address.to_string(), "origin", None, Vec::new())
        .await
        .unwrap();
    commit_files(&clone, &[("b.txt", "local")], "local work").await;

    let error = clone
        .push(&address.to_string(), "origin", branch("main"))
        .await
        .unwrap_err();

    assert!(matches!(BruvError::classify(&error), Some(BruvError::WriteRejected(_))));
    assert!(error.to_string().contains("bruv merge"));
    assert_eq!(origin.refs().read_ref(&branch("main")).unwrap(), Some(tip));
}

#[tokio::test]
async fn receive_pack_without_a_branch_targets_main() {
    let (_root, origin, address, tip) = served_origin().await;

    let replies = exchange(address, &["receive-pack origin"]).await;

    assert_eq!(replies.len(), 1);
    assert!(replies[0].starts_with("error: "));
    assert!(replies[0].contains("use 'bruv merge'") || replies[0].contains("Use 'bruv merge'"));
    assert_eq!(origin.refs().read_ref(&branch("main")).unwrap(), Some(tip));
}

#[tokio::test]
async fn receive_pack_refuses_a_ref_line_naming_main() {
    let (_root, origin, address, tip) = served_origin().await;
    let forged = ObjectId::for_content(ObjectType::Commit, b"forged");

    let replies = exchange(
        address,
        &[
            "receive-pack origin --branch feature",
            format!("{forged} refs/heads/main").as_str(),
        ],
    )
    .await;

    assert_eq!(replies[0], "ok");
    assert!(replies[1].starts_with("error: "));
    assert_eq!(origin.refs().read_ref(&branch("main")).unwrap(), Some(tip));
}

/// Push a ref line and raw pack bytes to `feature`, returning the reply lines
async fn push_raw_pack(address: SocketAddr, oid: &ObjectId, pack: &[u8]) -> Vec<String> {
    let stream = TcpStream::connect(address).await.unwrap();
    let (reader, mut writer) = stream.into_split();
    let mut request = format!(
        "receive-pack origin --branch feature\n{oid} refs/heads/feature\npack {}\n",
        pack.len()
    )
    .into_bytes();
    request.extend_from_slice(pack);
    writer.write_all(&request).await.unwrap();
    writer.shutdown().await.unwrap();

    let mut replies = Vec::new();
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        replies.push(line);
    }

    replies
}

#[tokio::test]
async fn pushed_commit_with_a_malformed_author_is_an_error_line() {
    let (_root, origin, address, _tip) = served_origin().await;
    let scratch = TempDir::new().unwrap();
    let database = Database::new(scratch.path().to_path_buf().into_boxed_path());
    let tree = ObjectId::for_content(ObjectType::Tree, b"");
    let raw = format!("tree {tree}\nauthor x>y <z 1 +0000\ncommitter x>y <z 1 +0000\n\nbad");
    let commit = database.put(ObjectType::Commit, raw.as_bytes()).unwrap();
    let pack = PackEncoder::new(&database)
        .encode(&BTreeSet::from([commit.clone()]))
        .unwrap();

    let replies = push_raw_pack(address, &commit, &pack).await;

    assert_eq!(replies[0], "ok");
    assert!(replies.last().unwrap().starts_with("error: "));
    assert_eq!(origin.refs().read_ref(&branch("feature")).unwrap(), None);
}

#[tokio::test]
async fn pushed_pack_claiming_too_many_objects_is_an_error_line() {
    let (_root, origin, address, _tip) = served_origin().await;
    let mut pack = b"PACK\0\0\0\x02\xff\xff\xff\xff".to_vec();
    let checksum = Sha1::digest(&pack);
    pack.extend_from_slice(checksum.as_slice());
    let forged = ObjectId::for_content(ObjectType::Commit, b"forged");

    let replies = push_raw_pack(address, &forged, &pack).await;

    assert_eq!(replies[0], "ok");
    assert!(replies.last().unwrap().starts_with("error: "));
    assert_eq!(origin.refs().read_ref(&branch("feature")).unwrap(), None);

    // the server keeps serving after the bad push
    let replies = exchange(address, &["upload-pack origin"]).await;
    assert!(replies[0].ends_with(" refs/heads/main"));
}

#[tokio::test]
async fn pushing_a_feature_branch_then_merging_it() {
    let (_root, origin, address, _tip) = served_origin().await;
    let clone_dir = TempDir::new().unwrap();
    let clone = Repository::new(clone_dir.path(), Box::new(std::io::sink())).unwrap();
    clone
        .clone_from_remote(&address.to_string(), "origin", None, Vec::new())
        .await
        .unwrap();
    clone.branch("feature", None).unwrap();
    clone.refs().set_head(&branch("feature")).unwrap();
    let feature_tip = commit_files(&clone, &[("b.txt", "feature")], "feature work").await;

    clone
        .push(&address.to_string(), "origin", branch("feature"))
        .await
        .unwrap();
    assert_eq!(
        origin.refs().read_ref(&branch("feature")).unwrap(),
        Some(feature_tip.clone())
    );

    let id = clone
        .request_merge(&address.to_string(), "origin", branch("feature"), branch("main"))
        .await
        .unwrap();
    assert_eq!(origin.merge_requests().load(id).unwrap().status(), Status::Pending);

    origin.approve(&id.to_string(), "owner".to_string()).unwrap();
    assert_eq!(origin.refs().read_ref(&branch("main")).unwrap(), Some(feature_tip));
}

#[tokio::test]
async fn merge_request_for_unknown_branch_is_an_error_line() {
    let (_root, origin, address, _tip) = served_origin().await;

    let replies = exchange(address, &["merge-request origin", "nope main alice"]).await;

    assert_eq!(replies[0], "ok");
    assert!(replies[1].starts_with("error: "));
    assert!(origin.merge_requests().list().unwrap().is_empty());
}

#[tokio::test]
async fn repository_paths_cannot_escape_the_root() {
    let (root, _origin, address, _tip) = served_origin().await;
    let outside = init_repository(&root.path().parent().unwrap().join(format!(
        "outside-{}",
        root.path().file_name().unwrap().to_string_lossy()
    )))
    .await;

    let replies = exchange(
        address,
        &[format!(
            "upload-pack ../{}",
            outside.path().file_name().unwrap().to_string_lossy()
        )
        .as_str()],
    )
    .await;

    assert_eq!(replies.len(), 1);
    assert!(replies[0].starts_with("error: "));
    std::fs::remove_dir_all(outside.path()).unwrap();
}

#[tokio::test]
async fn pull_fast_forwards_and_then_reports_up_to_date() {
    let (_root, origin, address, _tip) = served_origin().await;
    let clone_dir = TempDir::new().unwrap();
    let clone = Repository::new(clone_dir.path(), Box::new(std::io::sink())).unwrap();
    clone
        .clone_from_remote(&address.to_string(), "origin", None, Vec::new())
        .await
        .unwrap();

    let new_tip = commit_files(&origin, &[("c.txt", "upstream")], "upstream work").await;
    clone
        .pull(&address.to_string(), "origin", None, Vec::new())
        .await
        .unwrap();
    assert_eq!(clone.refs().read_ref(&branch("main")).unwrap(), Some(new_tip.clone()));

    clone
        .pull(&address.to_string(), "origin", None, Vec::new())
        .await
        .unwrap();
    assert_eq!(clone.refs().read_ref(&branch("main")).unwrap(), Some(new_tip));
}

#[tokio::test]
async fn upload_pack_of_an_empty_branch_is_an_error_line() {
    let root = TempDir::new().unwrap();
    init_repository(&root.path().join("empty")).await;
    let address = start_server(root.path()).await;

    let replies = exchange(address, &["upload-pack empty"]).await;

    assert_eq!(replies.len(), 1);
    assert!(replies[0].starts_with("error: "));
}
