use crate::areas::repository::Repository;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use std::path::Path;

impl Repository {
    /// List a tree, or the tree of a commit
    pub fn ls_tree(&self, revision: &str, recursive: bool) -> anyhow::Result<()> {
        let oid = self.resolve_object(revision)?;

        match self.database().parse_object_as_commit(&oid)? {
            Some(commit) => self.print_tree(commit.tree_oid(), Path::new(""), recursive),
            None => self.print_tree(&oid, Path::new(""), recursive),
        }
    }

    fn print_tree(&self, oid: &ObjectId, prefix: &Path, recursive: bool) -> anyhow::Result<()> {
        let Some(tree) = self.database().parse_object_as_tree(oid)? else {
            return Ok(());
        };

        for (name, entry) in tree.entries() {
            let path = prefix.join(name);

            if entry.is_tree() && recursive {
                self.print_tree(&entry.oid, &path, recursive)?;
                continue;
            }

            let object_type = if entry.is_tree() {
                ObjectType::Tree
            } else {
                ObjectType::Blob
            };
            writeln!(
                self.writer(),
                "{} {} {}\t{}",
                entry.mode.as_str(),
                object_type,
                entry.oid,
                path.display()
            )?;
        }

        Ok(())
    }
}
