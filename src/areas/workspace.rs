//! Working directory operations
//!
//! The workspace is the checked-out file tree next to `.kit/`. All paths
//! handed out or accepted here are repository-relative; the workspace owns
//! the translation to absolute paths.

use crate::artifacts::index::entry_mode::{EntryMode, FileMode};
use crate::artifacts::index::index_entry::EntryMetadata;
use anyhow::Context;
use bytes::Bytes;
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const IGNORED_PATHS: [&str; 3] = [".kit", ".", ".."];

#[derive(Debug)]
pub struct Workspace {
    path: Box<Path>,
}

impl Workspace {
    pub fn new(path: Box<Path>) -> Self {
        Workspace { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// List the files under a path, repository-relative, skipping `.kit`.
    ///
    /// A file path lists as itself; a directory expands to every file it
    /// transitively contains.
    pub fn list_files(&self, root_file_path: Option<PathBuf>) -> anyhow::Result<Vec<PathBuf>> {
        let root_file_path = match root_file_path {
            Some(p) => std::fs::canonicalize(p)?,
            None => self.path.clone().into(),
        };

        if !root_file_path.exists() {
            anyhow::bail!("The specified path does not exist: {:?}", root_file_path);
        }

        if root_file_path.is_dir() {
            Ok(WalkDir::new(&root_file_path)
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter_map(|entry| self.check_if_not_ignored_file_path(entry.path()))
                .collect::<Vec<_>>())
        } else {
            Ok(vec![
                root_file_path
                    .strip_prefix(self.path.as_ref())
                    .map(PathBuf::from)
                    .unwrap_or_default(),
            ])
        }
    }

    fn is_ignored(path: &Path) -> bool {
        path.components().any(|component| {
            if let std::path::Component::Normal(name) = component {
                let name_str = name.to_string_lossy();
                IGNORED_PATHS.contains(&name_str.as_ref())
            } else {
                false
            }
        })
    }

    fn check_if_not_ignored_file_path(&self, path: &Path) -> Option<PathBuf> {
        if path.is_file() && !Self::is_ignored(path) {
            Some(path.strip_prefix(self.path.as_ref()).ok()?.to_path_buf())
        } else {
            None
        }
    }

    pub fn read_file(&self, file_path: &Path) -> anyhow::Result<Bytes> {
        let file_path = self.path.join(file_path);

        let content = std::fs::read(&file_path)
            .with_context(|| format!("Failed to read file: {:?}", file_path))?;

        Ok(Bytes::from(content))
    }

    pub fn stat_file(&self, file_path: &Path) -> anyhow::Result<EntryMetadata> {
        let metadata = std::fs::metadata(self.path.join(file_path))?;

        (file_path, metadata).try_into()
    }

    /// Write a file, creating intermediate directories as needed and
    /// applying the executable bit when the mode calls for it.
    pub fn write_file(
        &self,
        file_path: &Path,
        data: &Bytes,
        mode: &EntryMode,
    ) -> anyhow::Result<()> {
        let absolute_path = self.path.join(file_path);

        if let Some(parent) = absolute_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }

        // a leftover directory under the same name must make way for the file
        if absolute_path.is_dir() {
            std::fs::remove_dir_all(&absolute_path)
                .with_context(|| format!("Failed to remove directory: {:?}", absolute_path))?;
        }

        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&absolute_path)
            .with_context(|| format!("Failed to open file: {:?}", file_path))?;

        file.write_all(data)
            .with_context(|| format!("Failed to write to file: {:?}", file_path))?;

        #[cfg(unix)]
        if matches!(mode, EntryMode::File(FileMode::Executable)) {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o755);
            std::fs::set_permissions(&absolute_path, permissions)
                .with_context(|| format!("Failed to set permissions for file: {:?}", file_path))?;
        }

        Ok(())
    }

    /// Remove a tracked file and any parent directories the removal left
    /// empty. Missing files are fine: the path may already be gone.
    pub fn remove_file(&self, file_path: &Path) -> anyhow::Result<()> {
        let absolute_path = self.path.join(file_path);

        match std::fs::remove_file(&absolute_path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to remove file: {:?}", file_path));
            }
        }

        self.prune_empty_parents(file_path)
    }

    fn prune_empty_parents(&self, file_path: &Path) -> anyhow::Result<()> {
        let mut parent = file_path.parent();

        while let Some(dir_path) = parent {
            if dir_path.as_os_str().is_empty() {
                break;
            }

            let absolute_dir = self.path.join(dir_path);
            match absolute_dir.read_dir() {
                Ok(mut entries) if entries.next().is_none() => {
                    std::fs::remove_dir(&absolute_dir).with_context(|| {
                        format!("Failed to remove empty directory: {:?}", dir_path)
                    })?;
                }
                _ => break,
            }

            parent = dir_path.parent();
        }

        Ok(())
    }
}
