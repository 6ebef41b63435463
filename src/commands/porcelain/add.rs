use crate::areas::repository::Repository;
use crate::artifacts::core::RepoError;
use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::objects::blob::Blob;
use std::path::PathBuf;

impl Repository {
    /// Stage files for the next commit.
    ///
    /// Each path is expanded (directories to the files they contain), its
    /// content stored as a blob, and the index entry upserted. A path that
    /// does not exist fails the whole command with `PathNotFound` before
    /// the index is rewritten.
    pub async fn add(&mut self, paths: &[String]) -> anyhow::Result<()> {
        let index = self.index();
        let mut index = index.lock().await;

        // Load the index file from the disk
        index.rehydrate()?;

        // Expand each provided path, expanding directories to their files
        let mut expanded = Vec::new();
        for path in paths {
            let absolute_path = self.workspace().path().join(path);
            if !absolute_path.exists() {
                return Err(RepoError::PathNotFound(PathBuf::from(path)).into());
            }

            let absolute_path = absolute_path.canonicalize()?;
            expanded.extend(self.workspace().list_files(Some(absolute_path))?);
        }

        for path in expanded {
            let data = self.workspace().read_file(&path)?;
            let stat = self.workspace().stat_file(&path)?;

            let blob = Blob::new(data, stat.clone().mode.try_into()?);
            let blob_id = self.database().store(blob)?;

            index.add(IndexEntry::new(path, blob_id, stat))?;
        }

        index.write_updates()?;

        Ok(())
    }
}
