// Gitkit - Git-compatible object store
// Copyright (C) 2025 Gitkit Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published
// by the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.

//! Tree objects: one directory level of a snapshot
//!
//! Stored as a run of `<octal mode> <name>\0<20-byte id>` records, sorted
//! the way Git sorts them: byte-wise by name, with subtree names compared
//! as if they ended in `/`.

use crate::error::{GitError, GitResult};
use crate::object::ObjectType;
use crate::oid::Oid;
use std::cmp::Ordering;
use std::fmt;

/// Mode of a tree entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileMode {
    /// Subdirectory (40000)
    Tree,
    /// Regular file (100644)
    Blob,
    /// Executable file (100755)
    BlobExecutable,
    /// Symbolic link (120000)
    Link,
    /// Submodule commit (160000)
    Gitlink,
}

impl FileMode {
    /// Mode from its numeric value
    ///
    /// The historical group-writable `100664` reads as a regular file.
    pub fn from_u32(mode: u32) -> GitResult<Self> {
        match mode {
            0o040000 => Ok(FileMode::Tree),
            0o100644 | 0o100664 => Ok(FileMode::Blob),
            0o100755 => Ok(FileMode::BlobExecutable),
            0o120000 => Ok(FileMode::Link),
            0o160000 => Ok(FileMode::Gitlink),
            _ => Err(GitError::invalid_format(format!(
                "unknown file mode: {:o}",
                mode
            ))),
        }
    }

    /// Numeric value
    pub fn as_u32(&self) -> u32 {
        match self {
            FileMode::Tree => 0o040000,
            FileMode::Blob => 0o100644,
            FileMode::BlobExecutable => 0o100755,
            FileMode::Link => 0o120000,
            FileMode::Gitlink => 0o160000,
        }
    }

    /// Type of the object the entry points at
    pub fn object_type(&self) -> ObjectType {
        match self {
            FileMode::Tree => ObjectType::Tree,
            FileMode::Gitlink => ObjectType::Commit,
            _ => ObjectType::Blob,
        }
    }

    /// Octal form without padding, as written inside tree objects
    fn as_tree_bytes(&self) -> &'static [u8] {
        match self {
            FileMode::Tree => b"40000",
            FileMode::Blob => b"100644",
            FileMode::BlobExecutable => b"100755",
            FileMode::Link => b"120000",
            FileMode::Gitlink => b"160000",
        }
    }
}

impl fmt::Display for FileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:06o}", self.as_u32())
    }
}

/// One name in a tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// File or directory name, no slashes
    pub name: String,
    /// Entry mode
    pub mode: FileMode,
    /// Target object
    pub id: Oid,
}

impl TreeEntry {
    /// Create an entry
    pub fn new(name: impl Into<String>, mode: FileMode, id: Oid) -> Self {
        TreeEntry {
            name: name.into(),
            mode,
            id,
        }
    }

    /// True for a subdirectory
    pub fn is_tree(&self) -> bool {
        self.mode == FileMode::Tree
    }

    /// Git's ordering of tree entries
    pub fn git_cmp(&self, other: &TreeEntry) -> Ordering {
        let a = sort_key(&self.name, self.is_tree());
        let b = sort_key(&other.name, other.is_tree());
        a.cmp(&b)
    }
}

fn sort_key(name: &str, is_tree: bool) -> Vec<u8> {
    let suffix: &[u8] = if is_tree { b"/" } else { b"" };
    name.as_bytes().iter().chain(suffix).copied().collect()
}

fn check_name(name: &str) -> GitResult<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains('/') || name.contains('\0')
    {
        return Err(GitError::invalid_format(format!(
            "invalid tree entry name: {:?}",
            name
        )));
    }
    Ok(())
}

/// Tree object
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tree {
    entries: Vec<TreeEntry>,
}

impl Tree {
    /// Empty tree
    pub fn new() -> Self {
        Tree::default()
    }

    /// Build a tree from entries in any order
    ///
    /// Names are validated and must be unique.
    pub fn from_entries(entries: impl IntoIterator<Item = TreeEntry>) -> GitResult<Self> {
        let mut tree = Tree::new();
        for entry in entries {
            if tree.get(&entry.name).is_some() {
                return Err(GitError::invalid_format(format!(
                    "duplicate tree entry: {}",
                    entry.name
                )));
            }
            tree.insert(entry)?;
        }
        Ok(tree)
    }

    /// Add or replace an entry, keeping Git order
    pub fn insert(&mut self, entry: TreeEntry) -> GitResult<()> {
        check_name(&entry.name)?;
        self.entries.retain(|e| e.name != entry.name);
        let at = self
            .entries
            .partition_point(|e| e.git_cmp(&entry) == Ordering::Less);
        self.entries.insert(at, entry);
        Ok(())
    }

    /// Remove an entry by name
    pub fn remove(&mut self, name: &str) -> Option<TreeEntry> {
        let at = self.entries.iter().position(|e| e.name == name)?;
        Some(self.entries.remove(at))
    }

    /// Entry by name
    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Entries in stored order
    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    /// Iterate entries
    pub fn iter(&self) -> std::slice::Iter<'_, TreeEntry> {
        self.entries.iter()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True for the empty tree
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse a tree payload, keeping entries in stored order
    pub fn parse(data: &[u8]) -> GitResult<Self> {
        let mut entries = Vec::new();
        let mut rest = data;

        while !rest.is_empty() {
            let space = rest
                .iter()
                .position(|b| *b == b' ')
                .ok_or_else(|| GitError::invalid_format("tree entry has no mode"))?;
            let mode = std::str::from_utf8(&rest[..space])
                .ok()
                .filter(|m| !m.is_empty() && m.bytes().all(|b| (b'0'..=b'7').contains(&b)))
                .and_then(|m| u32::from_str_radix(m, 8).ok())
                .ok_or_else(|| GitError::invalid_format("tree entry mode is not octal"))?;
            let mode = FileMode::from_u32(mode)?;
            rest = &rest[space + 1..];

            let nul = rest
                .iter()
                .position(|b| *b == 0)
                .ok_or_else(|| GitError::invalid_format("tree entry name is not terminated"))?;
            let name = std::str::from_utf8(&rest[..nul])
                .map_err(|_| GitError::invalid_format("tree entry name is not UTF-8"))?;
            check_name(name)?;
            rest = &rest[nul + 1..];

            if rest.len() < Oid::RAW_SIZE {
                return Err(GitError::invalid_format("tree entry id is truncated"));
            }
            let id = Oid::from_slice(&rest[..Oid::RAW_SIZE])?;
            rest = &rest[Oid::RAW_SIZE..];

            entries.push(TreeEntry::new(name, mode, id));
        }

        Ok(Tree { entries })
    }

    /// Canonical bytes
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.entries.len() * 48);
        for entry in &self.entries {
            out.extend_from_slice(entry.mode.as_tree_bytes());
            out.push(b' ');
            out.extend_from_slice(entry.name.as_bytes());
            out.push(0);
            out.extend_from_slice(entry.id.as_bytes());
        }
        out
    }
}

impl<'a> IntoIterator for &'a Tree {
    type Item = &'a TreeEntry;
    type IntoIter = std::slice::Iter<'a, TreeEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
