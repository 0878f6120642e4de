//! Hashing reader/writer for the index file
//!
//! Every byte that passes through is fed into a running SHA-1 digest, so the
//! trailing checksum can be written or verified without a second pass.

use crate::artifacts::core::error::BruvError;
use crate::artifacts::index::CHECKSUM_SIZE;
use bytes::Bytes;
use file_guard::FileGuard;
use sha1::{Digest, Sha1};
use std::io::{Read, Write};
use std::ops::DerefMut;

#[derive(Debug)]
pub struct Checksum<'f> {
    file: FileGuard<&'f mut std::fs::File>,
    digest: Sha1,
}

impl<'f> Checksum<'f> {
    pub fn new(file: FileGuard<&'f mut std::fs::File>) -> Self {
        Checksum {
            file,
            digest: Sha1::new(),
        }
    }

    pub fn read(&mut self, size: usize) -> anyhow::Result<Bytes> {
        let mut buffer = vec![0; size];
        self.file
            .deref_mut()
            .read_exact(&mut buffer)
            .map_err(|_| BruvError::CorruptIndex("unexpected end of file".into()))?;

        self.digest.update(&buffer);
        Ok(Bytes::from(buffer))
    }

    pub fn write(&mut self, data: &[u8]) -> anyhow::Result<()> {
        self.file.deref_mut().write_all(data)?;
        self.digest.update(data);
        Ok(())
    }

    pub fn write_checksum(&mut self) -> anyhow::Result<()> {
        let checksum = self.digest.clone().finalize();
        self.file.deref_mut().write_all(checksum.as_slice())?;
        self.file.deref_mut().flush()?;

        Ok(())
    }

    /// Compare the stored trailer against the digest of everything read so far
    pub fn verify(&mut self) -> anyhow::Result<()> {
        let mut expected = [0u8; CHECKSUM_SIZE];
        self.file
            .deref_mut()
            .read_exact(&mut expected)
            .map_err(|_| BruvError::CorruptIndex("missing checksum".into()))?;

        let actual = self.digest.clone().finalize();
        if expected != actual.as_slice() {
            return Err(BruvError::CorruptIndex("checksum does not match contents".into()).into());
        }

        let mut trailing = Vec::new();
        self.file.deref_mut().read_to_end(&mut trailing)?;
        if !trailing.is_empty() {
            return Err(BruvError::CorruptIndex("trailing bytes after checksum".into()).into());
        }

        Ok(())
    }
}
