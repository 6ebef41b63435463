//! References (branches and HEAD)
//!
//! Branches are files under `.kit/refs/heads/<name>` holding a commit hash.
//! HEAD is a single file at `.kit/HEAD` holding either
//!
//! - `ref: refs/heads/<name>` — symbolic, the usual state, or
//! - a bare commit hash — detached.
//!
//! Ref updates are written to a temp file and renamed into place so a
//! concurrent reader never observes a truncated value.

use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::core::RepoError;
use crate::artifacts::objects::object_id::ObjectId;
use anyhow::Context;
use derive_new::new;
use fake::rand;
use std::io::Write;
use std::path::Path;
use walkdir::WalkDir;

/// Regex pattern for parsing symbolic HEAD content
const SYMREF_REGEX: &str = r"^ref: refs/heads/(.+)$";

/// Name of the HEAD reference
pub const HEAD_REF_NAME: &str = "HEAD";

/// The repository's HEAD pointer.
///
/// Either symbolic (the usual state: HEAD names a branch) or detached
/// (HEAD holds a commit hash directly). Commits advance whatever the
/// current variant points at; only checkout changes the variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Head {
    Symbolic(BranchName),
    Detached(ObjectId),
}

/// Reference store rooted at the repository's `.kit` directory.
#[derive(Debug, new)]
pub struct Refs {
    path: Box<Path>,
}

impl Refs {
    /// Parse the HEAD file into its variant.
    pub fn read_head(&self) -> anyhow::Result<Head> {
        let content = match std::fs::read_to_string(self.head_path()) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RepoError::RefNotFound(HEAD_REF_NAME.to_string()).into());
            }
            Err(e) => return Err(e).context("failed to read HEAD"),
        };
        let content = content.trim();

        if content.is_empty() {
            return Err(RepoError::RefNotFound(HEAD_REF_NAME.to_string()).into());
        }

        let symref_match = regex::Regex::new(SYMREF_REGEX)?.captures(content);
        match symref_match {
            Some(symref_match) => Ok(Head::Symbolic(BranchName::try_parse(
                symref_match[1].to_string(),
            )?)),
            None => Ok(Head::Detached(ObjectId::try_parse(content.to_string())?)),
        }
    }

    /// The commit HEAD ultimately points at.
    ///
    /// Fails with `RefNotFound` when HEAD is symbolic and its branch has no
    /// commit yet (freshly initialized repository).
    pub fn resolve_head(&self) -> anyhow::Result<ObjectId> {
        match self.read_head()? {
            Head::Symbolic(branch_name) => self.get_ref(&branch_name),
            Head::Detached(oid) => Ok(oid),
        }
    }

    pub fn is_detached(&self) -> anyhow::Result<bool> {
        match self.read_head()? {
            Head::Symbolic(_) => Ok(false),
            Head::Detached(_) => Ok(true),
        }
    }

    /// Read the commit a branch points at, failing with `RefNotFound` when
    /// the branch does not exist or is still unborn.
    pub fn get_ref(&self, branch_name: &BranchName) -> anyhow::Result<ObjectId> {
        self.try_read_ref(branch_name)?
            .ok_or_else(|| RepoError::RefNotFound(branch_name.to_string()).into())
    }

    /// Read a branch, distinguishing "absent or unborn" from hard failures.
    pub fn try_read_ref(&self, branch_name: &BranchName) -> anyhow::Result<Option<ObjectId>> {
        let ref_path = self.heads_path().join(branch_name.as_ref());

        if !ref_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&ref_path)
            .with_context(|| format!("failed to read ref file at {:?}", ref_path))?;
        let content = content.trim();

        if content.is_empty() {
            // an unborn branch: the file exists but no commit was made yet
            return Ok(None);
        }

        Ok(Some(ObjectId::try_parse(content.to_string())?))
    }

    /// Create or overwrite a branch ref atomically.
    pub fn update_ref(&self, branch_name: &BranchName, oid: &ObjectId) -> anyhow::Result<()> {
        let ref_path = self.heads_path().join(branch_name.as_ref());
        self.write_ref_file(&ref_path, oid.as_ref())
    }

    /// Point HEAD at a branch (symbolic state).
    pub fn set_head_to_branch(&self, branch_name: &BranchName) -> anyhow::Result<()> {
        self.write_ref_file(
            &self.head_path(),
            &format!("ref: refs/heads/{}", branch_name),
        )
    }

    /// Point HEAD directly at a commit (detached state).
    pub fn set_head_to_commit(&self, oid: &ObjectId) -> anyhow::Result<()> {
        self.write_ref_file(&self.head_path(), oid.as_ref())
    }

    /// Advance whatever HEAD currently points at to a new commit.
    ///
    /// The variant never changes here: a symbolic HEAD advances its branch,
    /// a detached HEAD moves itself.
    pub fn advance_head(&self, oid: &ObjectId) -> anyhow::Result<()> {
        match self.read_head()? {
            Head::Symbolic(branch_name) => self.update_ref(&branch_name, oid),
            Head::Detached(_) => self.set_head_to_commit(oid),
        }
    }

    pub fn create_branch(&self, name: &BranchName, source_oid: &ObjectId) -> anyhow::Result<()> {
        // an unborn default branch file may be overwritten, anything else may not
        if self.try_read_ref(name)?.is_some() && !name.is_default_branch() {
            anyhow::bail!("branch {} already exists", name);
        }

        self.update_ref(name, source_oid)
    }

    pub fn list_branches(&self) -> anyhow::Result<Vec<BranchName>> {
        let heads_path = self.heads_path();

        let mut branches = WalkDir::new(&heads_path)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| {
                let relative_path = entry.path().strip_prefix(&heads_path).ok()?;
                BranchName::try_parse(relative_path.to_string_lossy().to_string()).ok()
            })
            .collect::<Vec<_>>();
        branches.sort();

        Ok(branches)
    }

    fn write_ref_file(&self, path: &Path, raw_ref: &str) -> anyhow::Result<()> {
        let parent = path.parent().with_context(|| {
            format!("failed to resolve parent directory for ref file at {:?}", path)
        })?;
        std::fs::create_dir_all(parent)?;

        // write to a temp file in the same directory, then rename into place
        let temp_path = parent.join(format!(".tmp-ref-{}", rand::random::<u32>()));
        let mut temp_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .with_context(|| format!("failed to open temp ref file at {:?}", temp_path))?;
        temp_file.write_all(raw_ref.as_bytes())?;
        temp_file.flush()?;

        std::fs::rename(&temp_path, path)
            .with_context(|| format!("failed to rename ref file into {:?}", path))?;

        Ok(())
    }

    pub fn head_path(&self) -> Box<Path> {
        self.path.join(HEAD_REF_NAME).into_boxed_path()
    }

    pub fn refs_path(&self) -> Box<Path> {
        self.path.join("refs").into_boxed_path()
    }

    pub fn heads_path(&self) -> Box<Path> {
        self.refs_path().join("heads").into_boxed_path()
    }
}
