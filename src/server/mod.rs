//! TCP server for the wire protocol
//!
//! Each accepted connection runs in its own task, reads one command line and
//! dispatches it once against a repository found under the server root.

mod merge_request;
mod receive_pack;
mod upload_pack;

use crate::areas::repository::Repository;
use crate::artifacts::core::error::BruvError;
use crate::artifacts::protocol::command_line::{CommandLine, Verb};
use crate::artifacts::protocol::framing;
use anyhow::Context;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncWrite, BufReader};
use tokio::net::{TcpListener, TcpStream};

/// Serves every repository below one root directory
#[derive(Debug, Clone)]
pub struct Server {
    root: Box<Path>,
}

impl Server {
    pub fn new(root: &Path) -> anyhow::Result<Self> {
        let root = root
            .canonicalize()
            .with_context(|| format!("server root {} does not exist", root.display()))?;

        Ok(Server {
            root: root.into_boxed_path(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Accept connections forever
    pub async fn serve(self: Arc<Self>, listener: TcpListener) -> anyhow::Result<()> {
        tracing::info!(
            address = %listener.local_addr()?,
            root = %self.root.display(),
            "bruv server listening"
        );

        loop {
            let (stream, peer) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(err) => {
                    tracing::warn!(error = %err, "failed to accept connection");
                    continue;
                }
            };

            let server = self.clone();
            tokio::spawn(async move {
                if let Err(err) = server.handle_connection(stream, peer).await {
                    tracing::warn!(%peer, error = %format!("{err:#}"), "connection failed");
                }
            });
        }
    }

    async fn handle_connection(&self, stream: TcpStream, peer: SocketAddr) -> anyhow::Result<()> {
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);

        let Some(line) = framing::read_line(&mut reader).await? else {
            return Ok(());
        };
        tracing::debug!(%peer, command = %line, "received command");

        if let Err(err) = self.dispatch(&line, &mut reader, &mut writer).await {
            tracing::warn!(%peer, command = %line, error = %format!("{err:#}"), "request refused");
            framing::write_error(&mut writer, &format!("{err:#}")).await?;
        }

        Ok(())
    }

    /// Run one command; an `Err` is reported to the client as an `error:` line
    pub async fn dispatch<R, W>(
        &self,
        line: &str,
        reader: &mut R,
        writer: &mut W,
    ) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send,
    {
        let command = CommandLine::parse(line)?;
        let repository = self.open_repository(&command.repository)?;

        match command.verb {
            Verb::UploadPack => upload_pack::handle(&repository, &command, writer).await,
            Verb::ReceivePack => receive_pack::handle(&repository, &command, reader, writer).await,
            Verb::MergeRequest => merge_request::handle(&repository, reader, writer).await,
        }
    }

    /// Open a repository below the root; paths may not escape it
    fn open_repository(&self, repository_path: &str) -> anyhow::Result<Repository> {
        let path = self
            .root
            .join(repository_path)
            .canonicalize()
            .map_err(|_| {
                BruvError::NotFound(format!("repository '{repository_path}' does not exist"))
            })?;

        if !path.starts_with(&self.root) {
            return Err(BruvError::NotFound(format!(
                "repository '{repository_path}' is outside the server root"
            ))
            .into());
        }

        Repository::open(&path, Box::new(std::io::sink()))
    }
}

/// Bind `address` and serve `root` until the process exits
pub async fn run(root: PathBuf, address: &str) -> anyhow::Result<()> {
    let server = Arc::new(Server::new(&root)?);
    let listener = TcpListener::bind(address)
        .await
        .with_context(|| format!("could not bind {address}"))?;

    server.serve(listener).await
}
