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

//! The staging area, in Git's binary `index` format
//!
//! Layout: a 12-byte header (`DIRC`, version, entry count), the entries
//! sorted by path then stage, optional extensions, and a SHA-1 of all of
//! the above. Versions 2 and 3 are supported; version 3 only adds the
//! extended-flags word on entries that set the extended bit. Extensions are
//! skipped on read and not written back.

use crate::error::{GitError, GitResult};
use crate::lockfile::{LockFile, LockPolicy};
use crate::oid::Oid;
use std::cmp::Ordering;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::{debug, info};

const SIGNATURE: &[u8; 4] = b"DIRC";
const HEADER_LEN: usize = 12;
/// Entry bytes before the path, extended flags excluded
const ENTRY_FIXED_LEN: usize = 62;

const FLAG_ASSUME_VALID: u16 = 0x8000;
const FLAG_EXTENDED: u16 = 0x4000;
const FLAG_STAGE_MASK: u16 = 0x3000;
const FLAG_STAGE_SHIFT: u16 = 12;
const FLAG_NAME_MASK: u16 = 0x0fff;

/// Seconds and nanoseconds, as the index stores file times
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct IndexTime {
    /// Seconds since the epoch
    pub seconds: u32,
    /// Nanosecond part
    pub nanoseconds: u32,
}

impl IndexTime {
    /// Build a time
    pub fn new(seconds: u32, nanoseconds: u32) -> Self {
        IndexTime {
            seconds,
            nanoseconds,
        }
    }
}

/// One staged path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// Metadata change time
    pub ctime: IndexTime,
    /// Content change time
    pub mtime: IndexTime,
    /// Device number
    pub dev: u32,
    /// Inode number
    pub ino: u32,
    /// Mode, e.g. `0o100644`
    pub mode: u32,
    /// Owner uid
    pub uid: u32,
    /// Owner gid
    pub gid: u32,
    /// File size, truncated to 32 bits
    pub size: u32,
    /// Staged blob
    pub id: Oid,
    /// Flag word; stage and assume-valid live here
    pub flags: u16,
    /// Version 3 extended flags (skip-worktree, intent-to-add)
    pub extended_flags: u16,
    /// Path relative to the work tree, `/`-separated
    pub path: String,
}

impl IndexEntry {
    /// Entry for `path` with zeroed stat data
    pub fn new(path: impl Into<String>, mode: u32, id: Oid) -> Self {
        IndexEntry {
            ctime: IndexTime::default(),
            mtime: IndexTime::default(),
            dev: 0,
            ino: 0,
            mode,
            uid: 0,
            gid: 0,
            size: 0,
            id,
            flags: 0,
            extended_flags: 0,
            path: path.into(),
        }
    }

    /// Entry for a file on disk, stat data filled from its metadata
    pub fn from_file(workdir: &Path, path: &str, id: Oid) -> GitResult<Self> {
        let meta = fs::symlink_metadata(workdir.join(path))?;
        let mut entry = IndexEntry::new(path, file_mode(&meta), id);
        // The format keeps only the low 32 bits.
        entry.size = meta.len() as u32;
        entry.mtime = system_time(meta.modified().ok());
        fill_unix_stat(&mut entry, &meta);
        Ok(entry)
    }

    /// Merge stage: 0 for normal entries, 1-3 during a conflict
    pub fn stage(&self) -> u8 {
        ((self.flags & FLAG_STAGE_MASK) >> FLAG_STAGE_SHIFT) as u8
    }

    /// Set the merge stage (0-3)
    pub fn set_stage(&mut self, stage: u8) {
        let stage = (u16::from(stage) << FLAG_STAGE_SHIFT) & FLAG_STAGE_MASK;
        self.flags = (self.flags & !FLAG_STAGE_MASK) | stage;
    }

    /// True if the assume-valid bit is set
    pub fn assume_valid(&self) -> bool {
        self.flags & FLAG_ASSUME_VALID != 0
    }

    fn is_extended(&self) -> bool {
        self.extended_flags != 0
    }

    fn cmp_key(&self, other: &IndexEntry) -> Ordering {
        self.path
            .as_bytes()
            .cmp(other.path.as_bytes())
            .then(self.stage().cmp(&other.stage()))
    }
}

fn system_time(time: Option<std::time::SystemTime>) -> IndexTime {
    time.and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| IndexTime::new(d.as_secs() as u32, d.subsec_nanos()))
        .unwrap_or_default()
}

#[cfg(unix)]
fn file_mode(meta: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    if meta.file_type().is_symlink() {
        0o120000
    } else if meta.permissions().mode() & 0o111 != 0 {
        0o100755
    } else {
        0o100644
    }
}

#[cfg(not(unix))]
fn file_mode(meta: &fs::Metadata) -> u32 {
    if meta.file_type().is_symlink() {
        0o120000
    } else {
        0o100644
    }
}

#[cfg(unix)]
fn fill_unix_stat(entry: &mut IndexEntry, meta: &fs::Metadata) {
    use std::os::unix::fs::MetadataExt;
    entry.ctime = IndexTime::new(meta.ctime() as u32, meta.ctime_nsec() as u32);
    entry.dev = meta.dev() as u32;
    entry.ino = meta.ino() as u32;
    entry.uid = meta.uid();
    entry.gid = meta.gid();
}

#[cfg(not(unix))]
fn fill_unix_stat(entry: &mut IndexEntry, _meta: &fs::Metadata) {
    entry.ctime = entry.mtime;
}

fn corrupt(reason: impl Into<String>) -> GitError {
    GitError::corrupt("index", reason)
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, len: usize) -> GitResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| corrupt("unexpected end of index"))?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u32(&mut self) -> GitResult<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn u16(&mut self) -> GitResult<u16> {
        let bytes = self.take(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }
}

/// In-memory index, bound to the file it was loaded from
#[derive(Debug, Clone)]
pub struct Index {
    path: PathBuf,
    version: u32,
    entries: Vec<IndexEntry>,
}

impl Index {
    /// Empty index that will be written to `path`
    pub fn new(path: impl AsRef<Path>) -> Self {
        Index {
            path: path.as_ref().to_path_buf(),
            version: 2,
            entries: Vec::new(),
        }
    }

    /// Load the index at `path`; a missing file is an empty index
    pub fn open(path: impl AsRef<Path>) -> GitResult<Self> {
        let path = path.as_ref();
        match fs::read(path) {
            Ok(data) => {
                let mut index = Index::from_bytes(&data)?;
                index.path = path.to_path_buf();
                debug!(path = %path.display(), entries = index.entries.len(), "loaded index");
                Ok(index)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Index::new(path)),
            Err(e) => Err(e.into()),
        }
    }

    /// Parse index bytes, verifying the trailing checksum
    pub fn from_bytes(data: &[u8]) -> GitResult<Self> {
        if data.len() < HEADER_LEN + Oid::RAW_SIZE {
            return Err(corrupt("file too short"));
        }
        let (body, trailer) = data.split_at(data.len() - Oid::RAW_SIZE);
        if Oid::hash(body).as_bytes() != trailer {
            return Err(corrupt("checksum mismatch"));
        }

        let mut cur = Cursor { data: body, pos: 0 };
        if cur.take(4)? != SIGNATURE {
            return Err(corrupt("missing DIRC signature"));
        }
        let version = cur.u32()?;
        if version != 2 && version != 3 {
            return Err(GitError::invalid_format(format!(
                "unsupported index version {}",
                version
            )));
        }
        let count = cur.u32()? as usize;

        let mut entries = Vec::with_capacity(count.min(body.len() / ENTRY_FIXED_LEN));
        for _ in 0..count {
            let start = cur.pos;
            let ctime = IndexTime::new(cur.u32()?, cur.u32()?);
            let mtime = IndexTime::new(cur.u32()?, cur.u32()?);
            let dev = cur.u32()?;
            let ino = cur.u32()?;
            let mode = cur.u32()?;
            let uid = cur.u32()?;
            let gid = cur.u32()?;
            let size = cur.u32()?;
            let id = Oid::from_slice(cur.take(Oid::RAW_SIZE)?)?;
            let flags = cur.u16()?;

            let extended_flags = if flags & FLAG_EXTENDED != 0 {
                if version < 3 {
                    return Err(corrupt("extended flags in a version 2 index"));
                }
                cur.u16()?
            } else {
                0
            };

            let name_len = usize::from(flags & FLAG_NAME_MASK);
            let path_bytes = if name_len < usize::from(FLAG_NAME_MASK) {
                let bytes = cur.take(name_len)?;
                if cur.take(1)? != [0] {
                    return Err(corrupt("path is not NUL-terminated"));
                }
                bytes
            } else {
                // Long paths: length saturates, scan for the terminator.
                let rest = &body[cur.pos..];
                let nul = rest
                    .iter()
                    .position(|b| *b == 0)
                    .ok_or_else(|| corrupt("path is not NUL-terminated"))?;
                let bytes = cur.take(nul)?;
                cur.take(1)?;
                bytes
            };
            let path = std::str::from_utf8(path_bytes)
                .map_err(|_| corrupt("path is not UTF-8"))?
                .to_string();

            // Entries are NUL-padded to a multiple of eight bytes.
            let consumed = cur.pos - start;
            let padded = consumed.div_ceil(8) * 8;
            let padding = cur.take(padded - consumed)?;
            if padding.iter().any(|b| *b != 0) {
                return Err(corrupt("non-zero entry padding"));
            }

            entries.push(IndexEntry {
                ctime,
                mtime,
                dev,
                ino,
                mode,
                uid,
                gid,
                size,
                id,
                flags: flags & !(FLAG_EXTENDED | FLAG_NAME_MASK),
                extended_flags,
                path,
            });
        }

        while cur.pos < body.len() {
            let signature = cur.take(4)?;
            let size = cur.u32()? as usize;
            cur.take(size)?;
            if !signature[0].is_ascii_uppercase() {
                return Err(GitError::invalid_format(format!(
                    "unsupported required index extension {:?}",
                    String::from_utf8_lossy(signature)
                )));
            }
            debug!(
                extension = %String::from_utf8_lossy(signature),
                size,
                "skipping index extension"
            );
        }

        let mut index = Index {
            path: PathBuf::new(),
            version,
            entries,
        };
        index.sort();
        Ok(index)
    }

    /// Serialize with a fresh checksum
    ///
    /// Written as version 3 only if some entry carries extended flags.
    pub fn to_bytes(&self) -> Vec<u8> {
        let version: u32 = if self.entries.iter().any(IndexEntry::is_extended) {
            3
        } else {
            2
        };

        let mut out = Vec::with_capacity(HEADER_LEN + self.entries.len() * 80 + Oid::RAW_SIZE);
        out.extend_from_slice(SIGNATURE);
        out.extend_from_slice(&version.to_be_bytes());
        out.extend_from_slice(&(self.entries.len() as u32).to_be_bytes());

        for entry in &self.entries {
            let start = out.len();
            for word in [
                entry.ctime.seconds,
                entry.ctime.nanoseconds,
                entry.mtime.seconds,
                entry.mtime.nanoseconds,
                entry.dev,
                entry.ino,
                entry.mode,
                entry.uid,
                entry.gid,
                entry.size,
            ] {
                out.extend_from_slice(&word.to_be_bytes());
            }
            out.extend_from_slice(entry.id.as_bytes());

            let name_len = entry.path.len().min(usize::from(FLAG_NAME_MASK)) as u16;
            let mut flags = (entry.flags & !(FLAG_EXTENDED | FLAG_NAME_MASK)) | name_len;
            if entry.is_extended() {
                flags |= FLAG_EXTENDED;
            }
            out.extend_from_slice(&flags.to_be_bytes());
            if entry.is_extended() {
                out.extend_from_slice(&entry.extended_flags.to_be_bytes());
            }

            out.extend_from_slice(entry.path.as_bytes());
            let consumed = out.len() - start;
            // At least one NUL terminates the path.
            let padded = (consumed + 1).div_ceil(8) * 8;
            out.resize(start + padded, 0);
        }

        let checksum = Oid::hash(&out);
        out.extend_from_slice(checksum.as_bytes());
        out
    }

    /// Write back to the file it came from, under `index.lock`
    pub fn write(&self) -> GitResult<()> {
        self.write_with(&LockPolicy::default())
    }

    /// Write back using an explicit lock policy
    pub fn write_with(&self, policy: &LockPolicy) -> GitResult<()> {
        let mut lock = LockFile::acquire(&self.path, policy)?;
        lock.write_all(&self.to_bytes())?;
        lock.commit()?;
        info!(path = %self.path.display(), entries = self.entries.len(), "wrote index");
        Ok(())
    }

    fn sort(&mut self) {
        self.entries.sort_by(IndexEntry::cmp_key);
    }

    /// File this index reads from and writes to
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Format version as loaded
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Number of entries, all stages
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// True with no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry by position in sorted order
    pub fn get(&self, position: usize) -> Option<&IndexEntry> {
        self.entries.get(position)
    }

    /// Stage-0 entry for `path`
    pub fn find(&self, path: &str) -> Option<&IndexEntry> {
        self.find_stage(path, 0)
    }

    /// Entry for `path` at a given stage
    pub fn find_stage(&self, path: &str, stage: u8) -> Option<&IndexEntry> {
        self.entries
            .iter()
            .find(|e| e.path == path && e.stage() == stage)
    }

    /// Insert, replacing any entry with the same path and stage
    pub fn add(&mut self, entry: IndexEntry) -> GitResult<()> {
        if entry.path.is_empty()
            || entry.path.starts_with('/')
            || entry.path.ends_with('/')
            || entry.path.contains('\0')
            || entry.path.split('/').any(|c| c.is_empty() || c == "." || c == "..")
        {
            return Err(GitError::invalid_format(format!(
                "invalid index path: {:?}",
                entry.path
            )));
        }
        match self
            .entries
            .binary_search_by(|probe| probe.cmp_key(&entry))
        {
            Ok(at) => self.entries[at] = entry,
            Err(at) => self.entries.insert(at, entry),
        }
        Ok(())
    }

    /// Remove every stage of `path`; true if anything was removed
    pub fn remove(&mut self, path: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.path != path);
        self.entries.len() != before
    }

    /// Drop all entries
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entries in sorted order
    pub fn iter(&self) -> std::slice::Iter<'_, IndexEntry> {
        self.entries.iter()
    }

    /// True if some path has entries at a non-zero stage
    pub fn has_conflicts(&self) -> bool {
        self.entries.iter().any(|e| e.stage() != 0)
    }
}

impl<'a> IntoIterator for &'a Index {
    type Item = &'a IndexEntry;
    type IntoIter = std::slice::Iter<'a, IndexEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
