//! Index entry representation
//!
//! Each entry in the index represents a staged file with:
//! - File path relative to the working-tree root
//! - Content hash (blob id)
//! - Stat metadata (mode, size, timestamps)
//!
//! ## Entry Format
//!
//! A fixed 62-byte block of big-endian fields and the raw hash, the path
//! bytes, then at least one NUL padding the entry to an 8-byte boundary.

use crate::artifacts::core::error::BruvError;
use crate::artifacts::index::entry_mode::{EntryMode, FileMode};
use crate::artifacts::objects::object::{Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use byteorder::{ByteOrder, WriteBytesExt};
use bytes::Bytes;
use derive_new::new;
use is_executable::IsExecutable;
use std::cmp::min;
use std::fs::Metadata;
use std::io::{BufRead, Write};
use std::os::unix::prelude::MetadataExt;
use std::path::{Path, PathBuf};

/// Largest path length the 12-bit flags field can carry
const MAX_PATH_SIZE: usize = 0xFFF;

/// Block size for entry alignment (8 bytes)
pub const ENTRY_BLOCK: usize = 8;

/// Fixed fields plus the shortest possible name and its NUL, rounded up
pub const ENTRY_MIN_SIZE: usize = 64;

/// Offset of the path bytes within an entry
const NAME_OFFSET: usize = 62;

#[derive(Debug, Clone, Default, new)]
pub struct IndexEntry {
    /// File path relative to the working-tree root
    pub name: PathBuf,
    /// Blob id of the staged content
    pub oid: ObjectId,
    pub metadata: EntryMetadata,
}

impl IndexEntry {
    /// Every proper ancestor directory, outermost first
    pub fn parent_dirs(&self) -> Vec<&Path> {
        let mut dirs = self
            .name
            .ancestors()
            .skip(1)
            .filter(|dir| !dir.as_os_str().is_empty())
            .collect::<Vec<_>>();
        dirs.reverse();

        dirs
    }
}

impl PartialEq for IndexEntry {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for IndexEntry {}

impl PartialOrd for IndexEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IndexEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.name.cmp(&other.name)
    }
}

/// Stat information captured when a file is staged
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryMetadata {
    pub ctime: i64,
    pub ctime_nsec: i64,
    pub mtime: i64,
    pub mtime_nsec: i64,
    pub dev: u64,
    pub ino: u64,
    pub mode: EntryMode,
    pub uid: u32,
    pub gid: u32,
    pub size: u64,
    /// Low 12 bits hold the path length, capped at 0xFFF
    pub flags: u32,
}

impl Packable for IndexEntry {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let entry_name = self
            .name
            .to_str()
            .ok_or_else(|| {
                anyhow::anyhow!("index path {} is not valid UTF-8", self.name.display())
            })?;
        let flags = min(entry_name.len(), MAX_PATH_SIZE) as u16;

        let mut entry_bytes = Vec::with_capacity(ENTRY_MIN_SIZE + entry_name.len());
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.ctime as u32)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.ctime_nsec as u32)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.mtime as u32)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.mtime_nsec as u32)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.dev as u32)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.ino as u32)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.mode.as_u32())?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.uid)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.gid)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.size as u32)?;
        self.oid.write_h40_to(&mut entry_bytes)?;
        entry_bytes.write_u16::<byteorder::NetworkEndian>(flags)?;
        entry_bytes.write_all(entry_name.as_bytes())?;

        entry_bytes.push(0);
        while entry_bytes.len() % ENTRY_BLOCK != 0 {
            entry_bytes.push(0);
        }

        Ok(Bytes::from(entry_bytes))
    }
}

impl Unpackable for IndexEntry {
    fn deserialize(reader: impl BufRead) -> anyhow::Result<Self> {
        let bytes = reader
            .bytes()
            .collect::<Result<Vec<u8>, std::io::Error>>()?;

        if bytes.len() < ENTRY_MIN_SIZE {
            return Err(BruvError::CorruptIndex("truncated entry".into()).into());
        }

        let field = |at: usize| byteorder::NetworkEndian::read_u32(&bytes[at..at + 4]);

        let mode = EntryMode::try_from(field(24))
            .map_err(|_| BruvError::CorruptIndex(format!("invalid entry mode {:o}", field(24))))?;
        let oid = ObjectId::read_h40_from(&mut &bytes[40..60])
            .map_err(|_| BruvError::CorruptIndex("invalid entry hash".into()))?;
        let flags = byteorder::NetworkEndian::read_u16(&bytes[60..62]) as u32;

        let name_end = bytes[NAME_OFFSET..]
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| BruvError::CorruptIndex("entry name is not terminated".into()))?;
        let name = std::str::from_utf8(&bytes[NAME_OFFSET..NAME_OFFSET + name_end])
            .map_err(|_| BruvError::CorruptIndex("entry name is not valid UTF-8".into()))?;

        Ok(IndexEntry {
            name: PathBuf::from(name),
            oid,
            metadata: EntryMetadata {
                ctime: field(0) as i64,
                ctime_nsec: field(4) as i64,
                mtime: field(8) as i64,
                mtime_nsec: field(12) as i64,
                dev: field(16) as u64,
                ino: field(20) as u64,
                mode,
                uid: field(28),
                gid: field(32),
                size: field(36) as u64,
                flags,
            },
        })
    }
}

impl TryFrom<(&Path, Metadata)> for EntryMetadata {
    type Error = anyhow::Error;

    fn try_from((file_path, metadata): (&Path, Metadata)) -> Result<Self, Self::Error> {
        let mode = match file_path.is_executable() {
            true => EntryMode::File(FileMode::Executable),
            false => EntryMode::File(FileMode::Regular),
        };
        let path_len = file_path.as_os_str().len();

        Ok(Self {
            ctime: metadata.ctime(),
            ctime_nsec: metadata.ctime_nsec(),
            mtime: metadata.mtime(),
            mtime_nsec: metadata.mtime_nsec(),
            dev: metadata.dev(),
            ino: metadata.ino(),
            mode,
            uid: metadata.uid(),
            gid: metadata.gid(),
            size: metadata.size(),
            flags: min(path_len, MAX_PATH_SIZE) as u32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::objects::object_type::ObjectType;
    use rstest::{fixture, rstest};

    #[fixture]
    fn oid() -> ObjectId {
        ObjectId::for_content(ObjectType::Blob, b"test data")
    }

    #[fixture]
    fn entry_metadata() -> EntryMetadata {
        EntryMetadata {
            mode: EntryMode::File(FileMode::Regular),
            size: 9,
            ..Default::default()
        }
    }

    #[rstest]
    fn parent_dirs_are_listed_outermost_first(oid: ObjectId, entry_metadata: EntryMetadata) {
        let entry = IndexEntry::new(PathBuf::from("a/b/c"), oid, entry_metadata);

        pretty_assertions::assert_eq!(entry.parent_dirs(), vec![Path::new("a"), Path::new("a/b")]);
    }

    #[rstest]
    fn top_level_entry_has_no_parent_dirs(oid: ObjectId, entry_metadata: EntryMetadata) {
        let entry = IndexEntry::new(PathBuf::from("a"), oid, entry_metadata);

        pretty_assertions::assert_eq!(entry.parent_dirs(), Vec::<&Path>::new());
    }

    #[rstest]
    #[case("a", 64)]
    #[case("abcdefghi.txt", 80)]
    #[case("ab", 72)]
    fn entries_pad_to_eight_bytes_with_at_least_one_nul(
        oid: ObjectId,
        entry_metadata: EntryMetadata,
        #[case] name: &str,
        #[case] expected_len: usize,
    ) {
        let entry = IndexEntry::new(PathBuf::from(name), oid, entry_metadata);

        let bytes = entry.serialize().unwrap();

        pretty_assertions::assert_eq!(bytes.len(), expected_len);
        assert_eq!(bytes[NAME_OFFSET + name.len()], 0);
    }

    #[rstest]
    fn entry_parses_back_with_path_length_flags(oid: ObjectId, entry_metadata: EntryMetadata) {
        let entry = IndexEntry::new(PathBuf::from("dir/a.txt"), oid.clone(), entry_metadata);

        let raw = entry.serialize().unwrap();
        let parsed = IndexEntry::deserialize(std::io::Cursor::new(raw)).unwrap();

        pretty_assertions::assert_eq!(parsed.name, PathBuf::from("dir/a.txt"));
        pretty_assertions::assert_eq!(parsed.oid, oid);
        pretty_assertions::assert_eq!(parsed.metadata.flags, 9);
        pretty_assertions::assert_eq!(parsed.metadata.size, 9);
    }

    #[rstest]
    fn long_paths_cap_the_flags_field(oid: ObjectId, entry_metadata: EntryMetadata) {
        let name = "x".repeat(5000);
        let entry = IndexEntry::new(PathBuf::from(&name), oid, entry_metadata);

        let raw = entry.serialize().unwrap();
        let parsed = IndexEntry::deserialize(std::io::Cursor::new(raw)).unwrap();

        pretty_assertions::assert_eq!(parsed.metadata.flags, 0xFFF);
        pretty_assertions::assert_eq!(parsed.name, PathBuf::from(name));
    }
}
