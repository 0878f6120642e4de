//! Async line and pack framing over a byte stream

use crate::artifacts::core::error::BruvError;
use crate::artifacts::protocol::ERROR_PREFIX;
use bytes::Bytes;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

const PACK_PREFIX: &str = "pack ";

/// Upper bound on a single framed pack
pub const MAX_PACK_SIZE: u64 = 1 << 30;

/// Upper bound on a protocol line, terminator included
pub const MAX_LINE_LENGTH: u64 = 64 * 1024;

/// Read one line without its terminator; `None` at end of stream
pub async fn read_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> anyhow::Result<Option<String>> {
    let mut line = String::new();
    let read = (&mut *reader)
        .take(MAX_LINE_LENGTH)
        .read_line(&mut line)
        .await?;
    if read == 0 {
        return Ok(None);
    }
    if !line.ends_with('\n') && read as u64 == MAX_LINE_LENGTH {
        return Err(BruvError::Unsupported(format!(
            "protocol line longer than {MAX_LINE_LENGTH} bytes"
        ))
        .into());
    }

    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

/// Read a line that must be present, turning `error:` replies into errors
pub async fn expect_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> anyhow::Result<String> {
    let line = read_line(reader)
        .await?
        .ok_or_else(|| anyhow::anyhow!("connection closed unexpectedly"))?;

    match line.strip_prefix(ERROR_PREFIX) {
        Some(message) => Err(anyhow::anyhow!("remote: {message}")),
        None => Ok(line),
    }
}

pub async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, line: &str) -> anyhow::Result<()> {
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;

    Ok(())
}

pub async fn write_error<W: AsyncWrite + Unpin>(
    writer: &mut W,
    message: &str,
) -> anyhow::Result<()> {
    write_line(writer, &format!("{ERROR_PREFIX}{message}")).await
}

/// `pack <length>` then the pack bytes
pub async fn write_pack<W: AsyncWrite + Unpin>(writer: &mut W, pack: &[u8]) -> anyhow::Result<()> {
    writer
        .write_all(format!("{PACK_PREFIX}{}\n", pack.len()).as_bytes())
        .await?;
    writer.write_all(pack).await?;
    writer.flush().await?;

    Ok(())
}

pub async fn read_pack<R: AsyncBufRead + Unpin>(reader: &mut R) -> anyhow::Result<Bytes> {
    let line = expect_line(reader).await?;
    let length = line
        .strip_prefix(PACK_PREFIX)
        .and_then(|length| length.parse::<u64>().ok())
        .ok_or_else(|| BruvError::CorruptPack(format!("expected a pack frame, got '{line}'")))?;

    if length > MAX_PACK_SIZE {
        return Err(
            BruvError::CorruptPack(format!("pack of {length} bytes exceeds the limit")).into(),
        );
    }

    let mut pack = vec![0u8; length as usize];
    reader
        .read_exact(&mut pack)
        .await
        .map_err(|_| BruvError::CorruptPack("connection closed inside a pack".into()))?;

    Ok(Bytes::from(pack))
}
