use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::BranchName;
use anyhow::Context;
use std::fs;
use std::io::Write;

const DEFAULT_BRANCH: &str = "master";

impl Repository {
    pub async fn init(&mut self) -> anyhow::Result<()> {
        fs::create_dir_all(self.database().objects_path())
            .context("Failed to create .kit/objects directory")?;

        fs::create_dir_all(self.refs().heads_path())
            .context("Failed to create .kit/refs/heads directory")?;

        let default_branch = BranchName::try_parse(DEFAULT_BRANCH.to_string())?;
        self.refs()
            .set_head_to_branch(&default_branch)
            .context("Failed to create initial HEAD reference")?;

        // the default branch starts unborn: present, but with no commit
        let head_ref_path = self.refs().heads_path().join(DEFAULT_BRANCH);
        if !head_ref_path.exists() {
            fs::write(&head_ref_path, b"").context("Failed to create default branch file")?;
        }

        let index = self.index();
        let index = index.lock().await;
        if !index.path().exists() {
            fs::write(index.path(), b"").context("Failed to create .kit/index file")?;
        }

        writeln!(
            self.writer(),
            "Initialized empty kit repository in {}",
            self.path().display()
        )?;

        Ok(())
    }
}
