use crate::areas::refs::{HEAD_REF_NAME, Head};
use crate::areas::repository::Repository;
use crate::artifacts::branch::REF_ALIASES;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::objects::object_id::ObjectId;
use std::io::Write;
use std::path::Path;

const DETACHMENT_NOTICE: &str = r#"
You are in 'detached HEAD' state. You can look around, make experimental
changes and commit them, and you can discard any commits you make in this
state without impacting any branches by performing another checkout.

If you want to create a new branch to retain commits you create, you may
do so (now or later) by using the branch command. Example:

    kit branch <new-branch-name>
"#;

impl Repository {
    /// Switch the working directory and HEAD to a branch or commit.
    ///
    /// The target resolves as a branch name first; anything that is not an
    /// existing branch is treated as a commit hash or unambiguous prefix.
    /// A branch target leaves HEAD symbolic, a hash target detaches it.
    ///
    /// Every tracked path is removed and rewritten from the target tree.
    /// Uncommitted changes to tracked files are discarded without warning;
    /// the target's blobs are all loaded before the first deletion, so an
    /// unresolvable target aborts with the working directory untouched.
    pub async fn checkout(&mut self, target: &str) -> anyhow::Result<()> {
        let index = self.index();
        let mut index = index.lock().await;

        index.rehydrate()?;

        let target = REF_ALIASES.get(target).copied().unwrap_or(target);
        let (new_head, target_oid) = self.resolve_checkout_target(target)?;

        let commit = self
            .database()
            .parse_object_as_commit(&target_oid)?
            .ok_or_else(|| anyhow::anyhow!("object {} is not a commit", target_oid))?;

        // prefetch the whole target tree up front
        let tree_files = self
            .database()
            .load_tree_files(commit.tree_oid(), Path::new(""))?;
        let mut materialized = Vec::with_capacity(tree_files.len());
        for (path, entry) in tree_files {
            let blob = self
                .database()
                .parse_object_as_blob(&entry.oid)?
                .ok_or_else(|| anyhow::anyhow!("tree entry {} is not a blob", entry.oid))?;
            materialized.push((path, blob.content().clone(), entry.mode));
        }

        let was_detached = self.refs().is_detached()?;

        match &new_head {
            Head::Symbolic(branch_name) => self.refs().set_head_to_branch(branch_name)?,
            Head::Detached(oid) => {
                if !was_detached {
                    eprintln!("Note: checking out '{}'.\n{}", target, DETACHMENT_NOTICE);
                }
                self.refs().set_head_to_commit(oid)?
            }
        }

        // clear tracked paths, then rebuild from the target tree
        for tracked in index.tracked_paths() {
            self.workspace().remove_file(&tracked)?;
        }

        for (path, content, mode) in &materialized {
            self.workspace().write_file(path, content, mode)?;
        }

        match &new_head {
            Head::Symbolic(branch_name) => {
                writeln!(self.writer(), "Switched to branch '{}'", branch_name)?
            }
            Head::Detached(oid) => writeln!(
                self.writer(),
                "HEAD is now at {} {}",
                oid.to_short_oid(),
                commit.short_message()
            )?,
        }

        Ok(())
    }

    /// Resolve a checkout target to the HEAD variant it implies and the
    /// commit it names.
    fn resolve_checkout_target(&self, target: &str) -> anyhow::Result<(Head, ObjectId)> {
        if target == HEAD_REF_NAME {
            // re-checking-out HEAD keeps its current variant
            let oid = self.refs().resolve_head()?;
            return Ok((self.refs().read_head()?, oid));
        }

        if let Ok(branch_name) = BranchName::try_parse(target.to_string())
            && let Some(oid) = self.refs().try_read_ref(&branch_name)?
        {
            return Ok((Head::Symbolic(branch_name), oid));
        }

        let oid = self.database().resolve_oid(target)?;
        Ok((Head::Detached(oid.clone()), oid))
    }
}
