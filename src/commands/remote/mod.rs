//! Clients of the server verbs
//!
//! - `clone`: Initialise a repository from a remote branch
//! - `pull`: Fast-forward a local branch from a remote one
//! - `push`: Send a non-protected branch to a remote
//! - `merge`: Ask a remote to merge a branch into a protected one

pub mod clone;
pub mod merge;
pub mod pull;
pub mod push;

use crate::areas::repository::Repository;
use crate::artifacts::protocol::DEFAULT_PORT;
use crate::artifacts::protocol::command_line::{CommandLine, RefLine};
use crate::artifacts::protocol::framing;
use crate::artifacts::pack::pack_file::PackDecoder;
use anyhow::Context;
use tokio::io::BufReader;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

/// One request/response exchange with a server
pub struct Connection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Connection {
    /// Connect and send the command line
    pub async fn open(address: &str, command: &CommandLine) -> anyhow::Result<Self> {
        let address = with_default_port(address);
        let stream = TcpStream::connect(&address)
            .await
            .with_context(|| format!("could not connect to {address}"))?;
        let (reader, writer) = stream.into_split();

        let mut connection = Connection {
            reader: BufReader::new(reader),
            writer,
        };
        tracing::debug!(%address, command = %command, "sending command");
        framing::write_line(&mut connection.writer, &command.to_string()).await?;

        Ok(connection)
    }

    pub fn reader(&mut self) -> &mut BufReader<OwnedReadHalf> {
        &mut self.reader
    }

    pub fn writer(&mut self) -> &mut OwnedWriteHalf {
        &mut self.writer
    }
}

fn with_default_port(address: &str) -> String {
    if address.contains(':') {
        address.to_string()
    } else {
        format!("{address}:{DEFAULT_PORT}")
    }
}

impl Repository {
    /// Run upload-pack and install the received objects
    ///
    /// Returns the advertised branch tip; the tip commit is guaranteed to be
    /// present locally afterwards.
    pub(crate) async fn fetch(
        &self,
        address: &str,
        command: &CommandLine,
    ) -> anyhow::Result<RefLine> {
        let mut connection = Connection::open(address, command).await?;

        let ref_line = RefLine::parse(&framing::expect_line(connection.reader()).await?)?;
        let pack = framing::read_pack(connection.reader()).await?;

        let installed = PackDecoder::new(self.database()).decode(&pack)?;
        self.database()
            .load_commit(&ref_line.oid)
            .with_context(|| format!("fetched pack does not contain {}", ref_line.oid))?;

        tracing::info!(branch = %ref_line.branch, objects = installed.len(), "fetched pack");

        Ok(ref_line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_hosts_use_the_default_port() {
        pretty_assertions::assert_eq!(with_default_port("localhost"), "localhost:9418");
        pretty_assertions::assert_eq!(with_default_port("127.0.0.1:4000"), "127.0.0.1:4000");
    }
}
