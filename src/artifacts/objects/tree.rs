//! Tree object
//!
//! Trees are stored directory snapshots. Each entry pairs a name and a mode
//! with the hash of a blob (file) or another tree (subdirectory).
//!
//! On disk: `tree <size>\0<entries>`, each entry `<mode> <name>\0<20-byte-sha1>`.
//!
//! ## Building
//!
//! A tree is built from the flat index by grouping entries on their first
//! path segment: entries with no remaining segments become blob references
//! at the current level, the rest recurse into subtrees. Levels are kept in
//! an ordered map so identical `(path, hash)` sets always produce identical
//! tree hashes, whatever order the entries were staged in.

use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::index::entry_mode::EntryMode;
use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::objects::object::Unpackable;
use crate::artifacts::objects::object::{Object, Packable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use anyhow::Context;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use std::path::PathBuf;

#[derive(Debug, Clone)]
enum TreeEntry {
    /// File entry (blob reference)
    File(IndexEntry),
    /// Directory entry (nested tree)
    Directory(Tree),
}

impl TreeEntry {
    fn mode(&self) -> &EntryMode {
        match self {
            TreeEntry::File(entry) => &entry.metadata.mode,
            TreeEntry::Directory(_) => &EntryMode::Directory,
        }
    }

    fn oid(&self) -> anyhow::Result<ObjectId> {
        match self {
            TreeEntry::File(entry) => Ok(entry.oid.clone()),
            TreeEntry::Directory(tree) => tree.object_id(),
        }
    }
}

/// A directory snapshot.
///
/// Trees maintain two sets of entries:
/// - `readable_entries`: for trees loaded from the database
/// - `writeable_entries`: for trees being built from the index
#[derive(Debug, Clone, Default)]
pub struct Tree {
    readable_entries: BTreeMap<String, DatabaseEntry>,
    writeable_entries: BTreeMap<String, TreeEntry>,
}

impl Tree {
    /// Build the root tree for a set of index entries.
    ///
    /// Entry paths are repository-relative. The result mirrors the directory
    /// structure of the paths; nothing is written to the database here, see
    /// [`Tree::traverse`] for storing.
    pub fn build<'a>(entries: impl Iterator<Item = &'a IndexEntry>) -> anyhow::Result<Self> {
        let seeds = entries
            .map(|entry| (entry.name.clone(), entry))
            .collect::<Vec<_>>();

        Self::build_level(seeds)
    }

    fn build_level(entries: Vec<(PathBuf, &IndexEntry)>) -> anyhow::Result<Self> {
        let mut tree = Self::default();
        let mut groups: BTreeMap<String, Vec<(PathBuf, &IndexEntry)>> = BTreeMap::new();

        for (relative, entry) in entries {
            let mut components = relative.components();
            let first = components
                .next()
                .context("empty index entry path")?
                .as_os_str()
                .to_str()
                .context("invalid path segment")?
                .to_string();
            let rest = components.as_path().to_path_buf();

            if rest.as_os_str().is_empty() {
                tree.writeable_entries.insert(first, TreeEntry::File(entry.clone()));
            } else {
                groups.entry(first).or_default().push((rest, entry));
            }
        }

        for (segment, group) in groups {
            let subtree = Self::build_level(group)?;
            // directory keys carry a trailing '/' so they sort the way git sorts them
            tree.writeable_entries
                .insert(format!("{segment}/"), TreeEntry::Directory(subtree));
        }

        Ok(tree)
    }

    /// Visit the tree depth-first, children before parents.
    ///
    /// Storing requires post-order: a parent's serialization embeds its
    /// children's hashes, so children must be written first.
    pub fn traverse<F>(&self, func: &F) -> anyhow::Result<()>
    where
        F: Fn(&Tree) -> anyhow::Result<()>,
    {
        for entry in self.writeable_entries.values() {
            if let TreeEntry::Directory(tree) = entry {
                tree.traverse(func)?;
            }
        }
        func(self)?;

        Ok(())
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &DatabaseEntry)> {
        self.readable_entries.iter()
    }

    pub fn into_entries(self) -> impl Iterator<Item = (String, DatabaseEntry)> {
        self.readable_entries.into_iter()
    }
}

impl Packable for Tree {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let mut content_bytes = Vec::new();

        for (name, tree_entry) in &self.writeable_entries {
            let name = name.trim_end_matches('/');

            let header = format!("{:o} {}", tree_entry.mode().as_u32(), name);
            content_bytes.write_all(header.as_bytes())?;
            content_bytes.push(0);
            tree_entry.oid()?.write_h40_to(&mut content_bytes)?;
        }

        let mut tree_bytes = Vec::new();
        let header = format!("{} {}\0", self.object_type().as_str(), content_bytes.len());
        tree_bytes.write_all(header.as_bytes())?;
        tree_bytes.write_all(&content_bytes)?;

        Ok(Bytes::from(tree_bytes))
    }
}

impl Unpackable for Tree {
    fn deserialize(reader: impl BufRead) -> anyhow::Result<Self> {
        let mut entries = BTreeMap::new();
        let mut reader = reader;

        // Reuse scratch buffers to reduce allocs
        let mut mode_bytes = Vec::new();
        let mut name_bytes = Vec::new();

        loop {
            mode_bytes.clear();
            let n = reader.read_until(b' ', &mut mode_bytes)?;
            if n == 0 {
                break; // clean EOF: no more entries
            }
            if *mode_bytes.last().unwrap() != b' ' {
                return Err(anyhow::anyhow!("unexpected EOF in mode"));
            }
            mode_bytes.pop();

            let mode_str = std::str::from_utf8(&mode_bytes)?;
            let mode = EntryMode::from_octal_str(mode_str)?;

            name_bytes.clear();
            let n = reader.read_until(b'\0', &mut name_bytes)?;
            if n == 0 || *name_bytes.last().unwrap() != b'\0' {
                return Err(anyhow::anyhow!("unexpected EOF in name"));
            }
            name_bytes.pop();
            let name = std::str::from_utf8(&name_bytes)?.to_owned();

            let oid =
                ObjectId::read_h40_from(&mut reader).context("unexpected EOF in object id")?;

            entries.insert(name, DatabaseEntry::new(oid, mode));
        }

        Ok(Tree {
            readable_entries: entries,
            writeable_entries: Default::default(),
        })
    }
}

impl Object for Tree {
    fn object_type(&self) -> ObjectType {
        ObjectType::Tree
    }

    fn display(&self) -> String {
        // a tree loaded from the database renders its stored entries
        if !self.readable_entries.is_empty() {
            return self
                .readable_entries
                .iter()
                .map(|(name, entry)| {
                    let object_type = if entry.is_tree() {
                        ObjectType::Tree
                    } else {
                        ObjectType::Blob
                    };

                    format!(
                        "{} {} {}\t{}",
                        entry.mode.as_str(),
                        object_type.as_str(),
                        entry.oid.as_ref(),
                        name
                    )
                })
                .collect::<Vec<String>>()
                .join("\n");
        }

        self.writeable_entries
            .iter()
            .map(|(name, tree_entry)| {
                let name = name.trim_end_matches('/');
                let object_type = match tree_entry {
                    TreeEntry::File(_) => ObjectType::Blob,
                    TreeEntry::Directory(_) => ObjectType::Tree,
                };

                format!(
                    "{} {} {}\t{}",
                    tree_entry.mode().as_str(),
                    object_type.as_str(),
                    tree_entry.oid().unwrap_or_default().as_ref(),
                    name
                )
            })
            .collect::<Vec<String>>()
            .join("\n")
    }
}
