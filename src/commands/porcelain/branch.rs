use crate::areas::refs::{HEAD_REF_NAME, Head};
use crate::areas::repository::Repository;
use crate::artifacts::branch::REF_ALIASES;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::objects::object_id::ObjectId;
use std::io::Write;

impl Repository {
    /// Create a branch pointing at the current HEAD commit, or at the
    /// given start point (a branch name, commit hash or prefix).
    pub fn branch(&mut self, name: &str, start_point: Option<&str>) -> anyhow::Result<()> {
        let branch_name = BranchName::try_parse(name.to_string())?;

        let source_oid = match start_point {
            Some(target) => self.resolve_branch_source(target)?,
            None => self.refs().resolve_head()?,
        };

        // a branch must point at a commit, not at any stored object
        if self
            .database()
            .parse_object_as_commit(&source_oid)?
            .is_none()
        {
            anyhow::bail!("object {} is not a commit", source_oid);
        }

        self.refs().create_branch(&branch_name, &source_oid)?;

        Ok(())
    }

    pub fn list_branches(&mut self) -> anyhow::Result<()> {
        let head = self.refs().read_head()?;

        for branch in self.refs().list_branches()? {
            let marker = match &head {
                Head::Symbolic(current) if current == &branch => "* ",
                _ => "  ",
            };
            writeln!(self.writer(), "{}{}", marker, branch)?;
        }

        Ok(())
    }

    fn resolve_branch_source(&self, target: &str) -> anyhow::Result<ObjectId> {
        let target = REF_ALIASES.get(target).copied().unwrap_or(target);

        if target == HEAD_REF_NAME {
            return self.refs().resolve_head();
        }

        if let Ok(existing) = BranchName::try_parse(target.to_string())
            && let Some(oid) = self.refs().try_read_ref(&existing)?
        {
            return Ok(oid);
        }

        self.database().resolve_oid(target)
    }
}
