//! Tree object
//!
//! Trees represent directory snapshots. They contain entries for files (blobs)
//! and subdirectories (other trees), along with their names and modes.
//!
//! ## Format
//!
//! On disk: `tree <size>\0<entries>`
//! Each entry: `<octal mode> <name>\0<20-byte-sha1>`
//!
//! Entries are ordered by name, with directories compared as `name/`, so the
//! same set of staged paths always produces the same bytes.

use crate::artifacts::core::error::BruvError;
use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::index::entry_mode::EntryMode;
use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::objects::object::Unpackable;
use crate::artifacts::objects::object::{Object, Packable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use anyhow::Context;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use std::path::Component;

#[derive(Debug, Clone)]
enum TreeEntry {
    /// A blob, or a subtree that already lives in the database
    Stored(DatabaseEntry),
    /// A subtree being built from the index
    Directory(Tree),
}

impl TreeEntry {
    fn mode(&self) -> &EntryMode {
        match self {
            TreeEntry::Stored(entry) => &entry.mode,
            TreeEntry::Directory(_) => &EntryMode::Directory,
        }
    }

    fn oid(&self) -> anyhow::Result<ObjectId> {
        match self {
            TreeEntry::Stored(entry) => Ok(entry.oid.clone()),
            TreeEntry::Directory(tree) => tree.object_id(),
        }
    }
}

/// Tree object representing a directory snapshot
///
/// Keys are entry names; directory keys carry a trailing `/` so that the map
/// order is the canonical entry order.
#[derive(Debug, Clone, Default)]
pub struct Tree {
    entries: BTreeMap<String, TreeEntry>,
}

impl Tree {
    /// Build a tree from index entries
    ///
    /// Files are organized into nested trees matching their path structure.
    /// The result does not depend on the order of `entries`.
    pub fn build<'e>(entries: impl Iterator<Item = &'e IndexEntry>) -> anyhow::Result<Self> {
        let mut root = Self::default();

        for entry in entries {
            let components = entry
                .name
                .components()
                .map(|component| match component {
                    Component::Normal(name) => name
                        .to_str()
                        .map(str::to_string)
                        .context("index path is not valid UTF-8"),
                    _ => Err(anyhow::anyhow!(
                        "index path {} is not relative",
                        entry.name.display()
                    )),
                })
                .collect::<anyhow::Result<Vec<_>>>()?;

            root.add_entry(&components, entry)?;
        }

        Ok(root)
    }

    /// Traverse the tree depth-first, children before parents
    ///
    /// Child ids must be known (and stored) before the parent that names them.
    pub fn traverse<F>(&self, func: &F) -> anyhow::Result<()>
    where
        F: Fn(&Tree) -> anyhow::Result<()>,
    {
        for entry in self.entries.values() {
            if let TreeEntry::Directory(tree) = entry {
                tree.traverse(func)?;
            }
        }
        func(self)
    }

    fn add_entry(&mut self, components: &[String], entry: &IndexEntry) -> anyhow::Result<()> {
        match components {
            [] => anyhow::bail!("empty index path"),
            [name] => {
                self.entries.remove(&format!("{name}/"));
                self.entries.insert(
                    name.clone(),
                    TreeEntry::Stored(DatabaseEntry::new(
                        entry.oid.clone(),
                        entry.metadata.mode.clone(),
                    )),
                );
            }
            [dir, rest @ ..] => {
                let key = format!("{dir}/");
                self.entries.remove(dir);

                let child = self
                    .entries
                    .entry(key)
                    .or_insert_with(|| TreeEntry::Directory(Tree::default()));

                match child {
                    TreeEntry::Directory(tree) => tree.add_entry(rest, entry)?,
                    TreeEntry::Stored(_) => anyhow::bail!("{dir} is already a stored tree"),
                }
            }
        }

        Ok(())
    }

    /// Entries of a tree loaded from the database, in canonical order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &DatabaseEntry)> {
        self.entries.iter().filter_map(|(name, entry)| match entry {
            TreeEntry::Stored(stored) => Some((name.trim_end_matches('/'), stored)),
            TreeEntry::Directory(_) => None,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Packable for Tree {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let mut content = Vec::new();

        for (name, entry) in &self.entries {
            let name = name.trim_end_matches('/');
            write!(content, "{:o} {}", entry.mode().as_u32(), name)?;
            content.push(0);
            entry.oid()?.write_h40_to(&mut content)?;
        }

        Ok(Bytes::from(content))
    }
}

impl Unpackable for Tree {
    fn deserialize(reader: impl BufRead) -> anyhow::Result<Self> {
        let mut entries = BTreeMap::new();
        let mut reader = reader;

        let mut mode_bytes = Vec::new();
        let mut name_bytes = Vec::new();

        loop {
            mode_bytes.clear();
            let n = reader.read_until(b' ', &mut mode_bytes)?;
            if n == 0 {
                break;
            }
            if mode_bytes.pop() != Some(b' ') {
                return Err(BruvError::CorruptObject("unexpected EOF in tree mode".into()).into());
            }

            let mode = EntryMode::from_octal_str(std::str::from_utf8(&mode_bytes)?)?;

            name_bytes.clear();
            reader.read_until(b'\0', &mut name_bytes)?;
            if name_bytes.pop() != Some(b'\0') {
                return Err(
                    BruvError::CorruptObject("unexpected EOF in tree entry name".into()).into(),
                );
            }
            let name = std::str::from_utf8(&name_bytes)?.to_owned();

            let oid = ObjectId::read_h40_from(&mut reader)
                .map_err(|_| BruvError::CorruptObject("unexpected EOF in tree entry id".into()))?;

            let key = if mode.is_tree() { format!("{name}/") } else { name };
            entries.insert(key, TreeEntry::Stored(DatabaseEntry::new(oid, mode)));
        }

        Ok(Tree { entries })
    }
}

impl Object for Tree {
    fn object_type(&self) -> ObjectType {
        ObjectType::Tree
    }

    fn display(&self) -> String {
        self.entries
            .iter()
            .map(|(name, entry)| {
                let object_type = if entry.mode().is_tree() {
                    ObjectType::Tree
                } else {
                    ObjectType::Blob
                };

                format!(
                    "{} {} {}\t{}",
                    entry.mode().as_str(),
                    object_type,
                    entry.oid().unwrap_or_default(),
                    name.trim_end_matches('/')
                )
            })
            .collect::<Vec<String>>()
            .join("\n")
    }
}
