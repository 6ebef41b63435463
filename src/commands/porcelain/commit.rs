use crate::areas::repository::Repository;
use crate::artifacts::core::RepoError;
use crate::artifacts::objects::commit::{Author, Commit};
use crate::artifacts::objects::object::Object;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tree::Tree;
use std::io::Write;

impl Repository {
    /// Capture the index as a commit and advance the current branch (or a
    /// detached HEAD) to it.
    ///
    /// The ref only moves after every tree object and the commit itself
    /// have been stored, so a failed write never leaves a ref pointing at
    /// a missing object. An empty index, or a tree identical to the one
    /// HEAD already points at, fails with `NothingToCommit`.
    pub async fn commit(
        &mut self,
        message: &str,
        author: Option<&str>,
    ) -> anyhow::Result<ObjectId> {
        let index = self.index();
        let mut index = index.lock().await;

        // Load the index file from the disk
        index.rehydrate()?;

        if index.is_empty() {
            return Err(RepoError::NothingToCommit.into());
        }

        let tree = Tree::build(index.entries())?;
        let tree_id = tree.object_id()?;

        let parent = self.resolve_parent()?;
        if let Some(parent_oid) = &parent {
            let parent_commit = self
                .database()
                .parse_object_as_commit(parent_oid)?
                .ok_or_else(|| anyhow::anyhow!("HEAD does not point at a commit"))?;

            if parent_commit.tree_oid() == &tree_id {
                return Err(RepoError::NothingToCommit.into());
            }
        }

        let store_tree = &|tree: &Tree| self.database().store(tree.clone()).map(|_| ());
        tree.traverse(store_tree)?;

        let author = Author::resolve(author)?;
        let message = message.trim().to_string();

        let commit = Commit::new(parent.clone(), tree_id, author, message);
        let commit_id = self.database().store(commit.clone())?;
        self.refs().advance_head(&commit_id)?;

        let is_root = match parent {
            Some(_) => "",
            None => "(root-commit) ",
        };

        writeln!(
            self.writer(),
            "[{}{}] {}",
            is_root,
            commit_id.to_short_oid(),
            commit.short_message()
        )?;

        Ok(commit_id)
    }

    /// The commit HEAD currently points at, or None on an unborn branch.
    fn resolve_parent(&self) -> anyhow::Result<Option<ObjectId>> {
        match self.refs().resolve_head() {
            Ok(oid) => Ok(Some(oid)),
            Err(e) => match e.downcast_ref::<RepoError>() {
                Some(RepoError::RefNotFound(_)) => Ok(None),
                _ => Err(e),
            },
        }
    }
}
