//! Reachability walks over the object graph
//!
//! commit → tree and parent, tree → every entry, blob → nothing.

use crate::areas::database::Database;
use crate::artifacts::core::error::BruvError;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object::Unpackable;
use crate::artifacts::objects::tree::Tree;
use derive_new::new;
use std::collections::BTreeSet;
use std::io::Cursor;
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
struct Walk {
    visited: BTreeSet<ObjectId>,
    complete_trees: BTreeSet<ObjectId>,
}

#[derive(Debug, new)]
pub struct ObjectCollector<'d> {
    database: &'d Database,
}

impl ObjectCollector<'_> {
    /// Every object reachable from a commit
    pub fn collect(&self, commit_oid: &ObjectId) -> anyhow::Result<BTreeSet<ObjectId>> {
        self.collect_selected(commit_oid, &[])
    }

    /// Objects reachable from a commit, with trees pruned to selected paths
    ///
    /// Every commit in the history and every tree on the way down to a
    /// selected path is kept; below a selected path nothing is pruned. An
    /// empty selection keeps everything.
    pub fn collect_selected(
        &self,
        commit_oid: &ObjectId,
        paths: &[PathBuf],
    ) -> anyhow::Result<BTreeSet<ObjectId>> {
        let mut walk = Walk::default();
        let mut pending_commits = vec![commit_oid.clone()];

        while let Some(oid) = pending_commits.pop() {
            if !walk.visited.insert(oid.clone()) {
                continue;
            }

            let commit = self.expect::<Commit>(&oid, ObjectType::Commit)?;
            self.walk_tree(commit.tree_oid(), Path::new(""), paths, &mut walk)?;

            if let Some(parent) = commit.parent() {
                pending_commits.push(parent.clone());
            }
        }

        Ok(walk.visited)
    }

    fn walk_tree(
        &self,
        tree_oid: &ObjectId,
        prefix: &Path,
        paths: &[PathBuf],
        walk: &mut Walk,
    ) -> anyhow::Result<()> {
        // a pruned walk of a tree does not cover a later unpruned one
        if walk.complete_trees.contains(tree_oid) {
            return Ok(());
        }
        walk.visited.insert(tree_oid.clone());
        if paths.is_empty() {
            walk.complete_trees.insert(tree_oid.clone());
        }

        let tree = self.expect::<Tree>(tree_oid, ObjectType::Tree)?;

        for (name, entry) in tree.entries() {
            let path = prefix.join(name);
            let selected_below =
                paths.is_empty() || paths.iter().any(|selected| path.starts_with(selected));
            let on_the_way = paths.iter().any(|selected| selected.starts_with(&path));

            if !selected_below && !on_the_way {
                continue;
            }

            if entry.is_tree() {
                let scope = if selected_below { &[][..] } else { paths };
                self.walk_tree(&entry.oid, &path, scope, walk)?;
            } else if !walk.visited.contains(&entry.oid) {
                // the blob only needs to exist; its payload is not parsed
                let (object_type, _) = self.database.get(&entry.oid)?;
                if object_type != ObjectType::Blob {
                    return Err(BruvError::CorruptObject(format!(
                        "{} is listed as a blob but is a {object_type}",
                        entry.oid
                    ))
                    .into());
                }
                walk.visited.insert(entry.oid.clone());
            }
        }

        Ok(())
    }

    fn expect<T: Unpackable>(&self, oid: &ObjectId, expected: ObjectType) -> anyhow::Result<T> {
        let (object_type, payload) = self.database.get(oid)?;
        if object_type != expected {
            return Err(BruvError::CorruptObject(format!(
                "{oid} should be a {expected} but is a {object_type}"
            ))
            .into());
        }

        T::deserialize(Cursor::new(payload))
    }
}
