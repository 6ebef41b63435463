//! Content-addressed object database
//!
//! Objects live under `.kit/objects/<2-char-prefix>/<38-char-remainder>`,
//! zlib-compressed. The store is append-only: an object is never rewritten
//! once present, and storing identical content again is a no-op.

use crate::artifacts::core::RepoError;
use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object::{Object, ObjectBox, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tree::Tree;
use crate::artifacts::objects::OBJECT_ID_LENGTH;
use anyhow::Context;
use bytes::Bytes;
use fake::rand;
use std::io::{BufRead, Cursor, Read, Write};
use std::path::{Path, PathBuf};

/// Shortest hash prefix accepted for abbreviated lookups.
pub const DEFAULT_ABBREV_MIN: usize = 2;

#[derive(Debug)]
pub struct Database {
    path: Box<Path>,
    abbrev_min: usize,
}

impl Database {
    pub fn new(path: Box<Path>) -> Self {
        Database {
            path,
            abbrev_min: DEFAULT_ABBREV_MIN,
        }
    }

    /// Override the minimum accepted prefix length for abbreviated lookups.
    pub fn with_abbrev_min(path: Box<Path>, abbrev_min: usize) -> Self {
        Database { path, abbrev_min }
    }

    pub fn objects_path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, object_id: &ObjectId) -> bool {
        self.path.join(object_id.to_path()).exists()
    }

    /// Read an object's decompressed envelope (`<kind> <size>\0<content>`).
    pub fn load(&self, object_id: &ObjectId) -> anyhow::Result<Bytes> {
        let object_path = self.path.join(object_id.to_path());

        self.read_object(object_path, object_id.as_ref())
    }

    /// Persist an object unless it already exists, returning its hash.
    ///
    /// Repeated stores of identical content return the same hash without
    /// writing a second copy.
    pub fn store(&self, object: impl Object) -> anyhow::Result<ObjectId> {
        let object_id = object.object_id()?;
        let object_path = self.path.join(object_id.to_path());

        if !object_path.exists() {
            std::fs::create_dir_all(
                object_path
                    .parent()
                    .context(format!("Invalid object path {}", object_path.display()))?,
            )
            .context(format!(
                "Unable to create object directory {}",
                object_path.display()
            ))?;

            self.write_object(object_path, object.serialize()?)?;
        }

        Ok(object_id)
    }

    /// Resolve a full hash or an unambiguous prefix to a stored object's ID.
    ///
    /// Prefixes shorter than the configured minimum never resolve. A prefix
    /// matching more than one object fails with `AmbiguousHash` rather than
    /// silently picking a match.
    pub fn resolve_oid(&self, hash_or_prefix: &str) -> anyhow::Result<ObjectId> {
        if hash_or_prefix.len() == OBJECT_ID_LENGTH {
            let oid = ObjectId::try_parse(hash_or_prefix.to_string())?;
            return if self.contains(&oid) {
                Ok(oid)
            } else {
                Err(RepoError::ObjectNotFound(hash_or_prefix.to_string()).into())
            };
        }

        if hash_or_prefix.len() < self.abbrev_min
            || !hash_or_prefix.chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(RepoError::ObjectNotFound(hash_or_prefix.to_string()).into());
        }

        let mut matches = self.find_objects_by_prefix(hash_or_prefix)?;
        if matches.len() > 1 {
            return Err(RepoError::AmbiguousHash {
                prefix: hash_or_prefix.to_string(),
                count: matches.len(),
            }
            .into());
        }

        matches
            .pop()
            .ok_or_else(|| RepoError::ObjectNotFound(hash_or_prefix.to_string()).into())
    }

    pub fn parse_object(&self, object_id: &ObjectId) -> anyhow::Result<ObjectBox> {
        let (object_type, object_reader) = self.parse_object_as_bytes(object_id)?;

        match object_type {
            ObjectType::Blob => Ok(ObjectBox::Blob(Box::new(Blob::deserialize(object_reader)?))),
            ObjectType::Tree => Ok(ObjectBox::Tree(Box::new(Tree::deserialize(object_reader)?))),
            ObjectType::Commit => Ok(ObjectBox::Commit(Box::new(Commit::deserialize(
                object_reader,
            )?))),
        }
    }

    pub fn parse_object_as_blob(&self, object_id: &ObjectId) -> anyhow::Result<Option<Blob>> {
        let (object_type, object_reader) = self.parse_object_as_bytes(object_id)?;

        match object_type {
            ObjectType::Blob => Ok(Some(Blob::deserialize(object_reader)?)),
            _ => Ok(None),
        }
    }

    pub fn parse_object_as_tree(&self, object_id: &ObjectId) -> anyhow::Result<Option<Tree>> {
        let (object_type, object_reader) = self.parse_object_as_bytes(object_id)?;

        match object_type {
            ObjectType::Tree => Ok(Some(Tree::deserialize(object_reader)?)),
            _ => Ok(None),
        }
    }

    pub fn parse_object_as_commit(&self, object_id: &ObjectId) -> anyhow::Result<Option<Commit>> {
        let (object_type, object_reader) = self.parse_object_as_bytes(object_id)?;

        match object_type {
            ObjectType::Commit => Ok(Some(Commit::deserialize(object_reader)?)),
            _ => Ok(None),
        }
    }

    /// Flatten the tree rooted at `tree_oid` into `(path, entry)` pairs,
    /// walking nested trees recursively.
    pub fn load_tree_files(
        &self,
        tree_oid: &ObjectId,
        prefix: &Path,
    ) -> anyhow::Result<Vec<(PathBuf, DatabaseEntry)>> {
        let tree = self
            .parse_object_as_tree(tree_oid)?
            .ok_or_else(|| anyhow::anyhow!("object {} is not a tree", tree_oid))?;

        let mut files = Vec::new();
        for (name, entry) in tree.into_entries() {
            let entry_path = prefix.join(&name);

            if entry.is_tree() {
                files.extend(self.load_tree_files(&entry.oid, &entry_path)?);
            } else {
                files.push((entry_path, entry));
            }
        }

        Ok(files)
    }

    fn parse_object_as_bytes(
        &self,
        object_id: &ObjectId,
    ) -> anyhow::Result<(ObjectType, impl BufRead)> {
        let object_content = self.load(object_id)?;
        let mut object_reader = Cursor::new(object_content);

        let object_type = ObjectType::parse_object_type(&mut object_reader)?;

        Ok((object_type, object_reader))
    }

    fn read_object(&self, object_path: PathBuf, object_id: &str) -> anyhow::Result<Bytes> {
        let object_content = match std::fs::read(&object_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RepoError::ObjectNotFound(object_id.to_string()).into());
            }
            Err(e) => {
                return Err(e).context(format!(
                    "Unable to read object file {}",
                    object_path.display()
                ));
            }
        };

        Self::decompress(object_content.into())
    }

    fn write_object(&self, object_path: PathBuf, object_content: Bytes) -> anyhow::Result<()> {
        let object_dir = object_path
            .parent()
            .context(format!("Invalid object path {}", object_path.display()))?;
        let temp_object_path = object_dir.join(Self::generate_temp_name());

        let object_content = Self::compress(object_content)?;

        let mut file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_object_path)
            .context(format!(
                "Unable to open object file {}",
                temp_object_path.display()
            ))?;

        file.write_all(&object_content).context(format!(
            "Unable to write object file {}",
            temp_object_path.display()
        ))?;

        // rename the temp file to the object file to make it atomic
        std::fs::rename(&temp_object_path, &object_path).context(format!(
            "Unable to rename object file to {}",
            object_path.display()
        ))?;

        Ok(())
    }

    fn compress(data: Bytes) -> anyhow::Result<Bytes> {
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder
            .write_all(&data)
            .context("Unable to compress object content")?;

        encoder
            .finish()
            .map(|compressed_content| compressed_content.into())
            .context("Unable to finish compressing object content")
    }

    fn decompress(data: Bytes) -> anyhow::Result<Bytes> {
        let mut decoder = flate2::read::ZlibDecoder::new(&*data);
        let mut decompressed_content = Vec::new();
        decoder
            .read_to_end(&mut decompressed_content)
            .context("Unable to decompress object content")?;

        Ok(decompressed_content.into())
    }

    fn generate_temp_name() -> String {
        format!("tmp-obj-{}", rand::random::<u32>())
    }

    /// Find all objects whose hash starts with the given prefix.
    ///
    /// For prefixes of 2+ characters only the matching fan-out directory is
    /// searched; shorter prefixes scan every directory.
    fn find_objects_by_prefix(&self, prefix: &str) -> anyhow::Result<Vec<ObjectId>> {
        let mut matches = Vec::new();

        if prefix.len() >= 2 {
            let dir_name = &prefix[..2];
            let file_prefix = &prefix[2..];
            let dir_path = self.path.join(dir_name);

            if dir_path.is_dir() {
                for entry in std::fs::read_dir(&dir_path)? {
                    let entry = entry?;
                    let file_name = entry.file_name();
                    let file_name_str = file_name.to_string_lossy();

                    if file_name_str.starts_with(file_prefix) {
                        let full_oid = format!("{}{}", dir_name, file_name_str);
                        if let Ok(oid) = ObjectId::try_parse(full_oid) {
                            matches.push(oid);
                        }
                    }
                }
            }
        } else {
            for i in 0..=255 {
                let dir_name = format!("{:02x}", i);
                let dir_path = self.path.join(&dir_name);

                if dir_path.is_dir() {
                    for entry in std::fs::read_dir(&dir_path)? {
                        let entry = entry?;
                        let file_name = entry.file_name();
                        let file_name_str = file_name.to_string_lossy();
                        let full_oid = format!("{}{}", dir_name, file_name_str);

                        if full_oid.starts_with(prefix) {
                            let oid = ObjectId::try_parse(full_oid)?;
                            matches.push(oid);
                        }
                    }
                }
            }
        }

        Ok(matches)
    }
}
