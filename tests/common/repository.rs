use crate::common::file::{FileSpec, write_file};
use bruv::areas::repository::Repository;
use bruv::artifacts::objects::object_id::ObjectId;
use bruv::server::Server;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Initialise a repository at `dir`, discarding command output
pub async fn init_repository(dir: &Path) -> Repository {
    let repository =
        Repository::new(dir, Box::new(std::io::sink())).expect("Failed to open repository");
    repository.init().await.expect("Failed to initialise repository");
    repository
}

/// Write `files`, stage them and commit
pub async fn commit_files(
    repository: &Repository,
    files: &[(&str, &str)],
    message: &str,
) -> ObjectId {
    for (path, content) in files {
        write_file(FileSpec::new(repository.path().join(path), content.to_string()));
    }

    let paths = files.iter().map(|(path, _)| path.to_string()).collect::<Vec<_>>();
    repository.add(&paths).await.expect("Failed to stage files");
    repository.commit(message).await.expect("Failed to commit")
}

/// Serve `root` on an ephemeral local port
pub async fn start_server(root: &Path) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind");
    let address = listener.local_addr().expect("Failed to read local address");
    let server = Arc::new(Server::new(root).expect("Failed to create server"));

    tokio::spawn(server.serve(listener));

    address
}
