use crate::areas::repository::Repository;
use crate::artifacts::objects::commit::{Author, Commit};
use crate::artifacts::objects::object::Object;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tree::Tree;

impl Repository {
    /// Record a commit of `tree_oid` on the current branch
    ///
    /// The parent is whatever the branch names now, so the branch always
    /// moves forward.
    pub fn write_commit(
        &self,
        tree_oid: ObjectId,
        message: String,
    ) -> anyhow::Result<(ObjectId, Commit)> {
        let parent = self.refs().read_head()?;
        let author = Author::load_from_env()?;

        let commit = Commit::new(parent, tree_oid, author, message);
        let commit_id = self.database().store(&commit)?;
        self.refs().update_head(&commit_id)?;

        tracing::debug!(commit = %commit_id, "advanced current branch");

        Ok((commit_id, commit))
    }

    /// Store the tree of the staged index, children first
    pub async fn write_tree(&self) -> anyhow::Result<ObjectId> {
        let index = self.index();
        let mut index = index.lock().await;

        index.rehydrate()?;

        let tree = Tree::build(index.entries())?;
        let store_tree = &|tree: &Tree| self.database().store(tree).map(|_| ());
        tree.traverse(store_tree)?;

        tree.object_id()
    }
}
