use crate::areas::repository::Repository;
use crate::artifacts::objects::object::{Object, ObjectBox};
use std::io::Write;

impl Repository {
    pub fn cat_file(&mut self, hash: &str) -> anyhow::Result<()> {
        let object_id = self.database().resolve_oid(hash)?;

        let rendered = match self.database().parse_object(&object_id)? {
            ObjectBox::Blob(blob) => blob.display(),
            ObjectBox::Tree(tree) => tree.display(),
            ObjectBox::Commit(commit) => commit.display(),
        };

        write!(self.writer(), "{}", rendered)?;

        Ok(())
    }
}
