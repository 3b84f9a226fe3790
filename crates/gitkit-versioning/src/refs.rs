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

//! Reference database: branches, tags, `HEAD`
//!
//! This module implements:
//! - **Loose refs**: one file per ref holding `<40-hex>\n` or `ref: <name>\n`
//! - **Packed refs**: the `packed-refs` file, including `^<hex>` peeled lines
//! - **Name validation**: the rules of `git check-ref-format`
//! - **Compare-and-swap updates**: writers hold `<ref>.lock` and check the
//!   expected old value before renaming the new value into place
//!
//! Readers take no locks. A loose ref shadows a packed ref of the same name.

use crate::error::{GitError, GitResult};
use crate::lockfile::{LockFile, LockPolicy};
use crate::oid::Oid;
use gitkit_config::RefsConfig;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Name of the packed refs file inside the git directory
pub const PACKED_REFS: &str = "packed-refs";

const SYMREF_PREFIX: &str = "ref: ";

/// What a reference points at
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RefTarget {
    /// An object id
    Direct(Oid),
    /// Another reference, by full name
    Symbolic(String),
}

/// A named pointer into the object graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    name: String,
    target: RefTarget,
    peeled: Option<Oid>,
}

impl Reference {
    /// Reference to an object
    pub fn direct(name: impl Into<String>, id: Oid) -> Self {
        Reference {
            name: name.into(),
            target: RefTarget::Direct(id),
            peeled: None,
        }
    }

    /// Reference to another reference
    pub fn symbolic(name: impl Into<String>, target: impl Into<String>) -> Self {
        Reference {
            name: name.into(),
            target: RefTarget::Symbolic(target.into()),
            peeled: None,
        }
    }

    /// Full name, e.g. `refs/heads/master`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Target
    pub fn target(&self) -> &RefTarget {
        &self.target
    }

    /// Object id for a direct ref
    pub fn id(&self) -> Option<Oid> {
        match self.target {
            RefTarget::Direct(id) => Some(id),
            RefTarget::Symbolic(_) => None,
        }
    }

    /// Target name for a symbolic ref
    pub fn symbolic_target(&self) -> Option<&str> {
        match &self.target {
            RefTarget::Symbolic(name) => Some(name),
            RefTarget::Direct(_) => None,
        }
    }

    /// Peeled id recorded in `packed-refs` for annotated tags
    pub fn peeled(&self) -> Option<Oid> {
        self.peeled
    }

    /// True under `refs/heads/`
    pub fn is_branch(&self) -> bool {
        self.name.starts_with("refs/heads/")
    }

    /// True under `refs/tags/`
    pub fn is_tag(&self) -> bool {
        self.name.starts_with("refs/tags/")
    }

    /// True under `refs/remotes/`
    pub fn is_remote(&self) -> bool {
        self.name.starts_with("refs/remotes/")
    }

    /// Name with the namespace prefix removed
    ///
    /// ```
    /// use gitkit_versioning::Reference;
    ///
    /// let r = Reference::symbolic("refs/heads/feature/auth", "x");
    /// assert_eq!(r.short_name(), "feature/auth");
    /// ```
    pub fn short_name(&self) -> &str {
        ["refs/heads/", "refs/tags/", "refs/remotes/", "refs/"]
            .iter()
            .find_map(|prefix| self.name.strip_prefix(prefix))
            .unwrap_or(&self.name)
    }
}

/// Check a full reference name
///
/// Follows `git check-ref-format`: no `..`, no control characters or any of
/// `` ~^:?*[\``, no component starting with `.` or ending in `.lock`, no
/// `@{`, no empty components. One-level names must be upper case like
/// `HEAD` or `ORIG_HEAD`; everything else lives under `refs/`.
pub fn validate_name(name: &str) -> GitResult<()> {
    let bad = |why: &str| GitError::invalid_format(format!("invalid reference name '{}': {}", name, why));

    if name.is_empty() {
        return Err(bad("empty"));
    }
    if name == "@" {
        return Err(bad("'@' alone is reserved"));
    }
    if name.contains("..") {
        return Err(bad("contains '..'"));
    }
    if name.contains("@{") {
        return Err(bad("contains '@{'"));
    }
    if name
        .chars()
        .any(|c| c.is_ascii_control() || matches!(c, ' ' | '~' | '^' | ':' | '?' | '*' | '[' | '\\'))
    {
        return Err(bad("contains a forbidden character"));
    }
    if name.ends_with('.') {
        return Err(bad("ends with '.'"));
    }
    for component in name.split('/') {
        if component.is_empty() {
            return Err(bad("empty path component"));
        }
        if component.starts_with('.') {
            return Err(bad("component starts with '.'"));
        }
        if component.ends_with(".lock") {
            return Err(bad("component ends with '.lock'"));
        }
    }

    if !name.contains('/') {
        let all_caps = name.bytes().all(|b| b.is_ascii_uppercase() || b == b'_');
        if !all_caps {
            return Err(bad("one-level names must be upper case"));
        }
    } else if !name.starts_with("refs/") {
        return Err(bad("must live under refs/"));
    }
    Ok(())
}

fn parse_loose(name: &str, content: &str) -> GitResult<RefTarget> {
    let content = content.trim_end();
    if let Some(target) = content.strip_prefix(SYMREF_PREFIX) {
        let target = target.trim();
        validate_name(target)
            .map_err(|_| GitError::corrupt(name, format!("bad symbolic target '{}'", target)))?;
        return Ok(RefTarget::Symbolic(target.to_string()));
    }

    // FETCH_HEAD-style files carry extra text after the id.
    let hex = content.split_whitespace().next().unwrap_or("");
    Oid::from_hex(hex)
        .map(RefTarget::Direct)
        .map_err(|_| GitError::corrupt(name, format!("unreadable reference content {:?}", content)))
}

fn parse_packed(content: &str) -> GitResult<Vec<Reference>> {
    let mut refs: Vec<Reference> = Vec::new();
    for (lineno, line) in content.lines().enumerate() {
        let bad = || GitError::corrupt(PACKED_REFS, format!("malformed line {}", lineno + 1));
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(peeled) = line.strip_prefix('^') {
            let last = refs.last_mut().ok_or_else(bad)?;
            last.peeled = Some(Oid::from_hex(peeled.trim()).map_err(|_| bad())?);
            continue;
        }
        let (hex, name) = line.split_once(' ').ok_or_else(bad)?;
        let id = Oid::from_hex(hex).map_err(|_| bad())?;
        refs.push(Reference::direct(name.trim(), id));
    }
    Ok(refs)
}

/// Loose and packed references of one repository
#[derive(Debug, Clone)]
pub struct RefDatabase {
    git_dir: PathBuf,
    lock_policy: LockPolicy,
    max_depth: usize,
}

impl RefDatabase {
    /// Reference database with default settings
    pub fn new(git_dir: impl AsRef<Path>) -> Self {
        Self::with_config(git_dir, &RefsConfig::default())
    }

    /// Reference database configured from the `[refs]` settings
    pub fn with_config(git_dir: impl AsRef<Path>, config: &RefsConfig) -> Self {
        RefDatabase {
            git_dir: git_dir.as_ref().to_path_buf(),
            lock_policy: LockPolicy::from(config),
            max_depth: config.max_symbolic_depth,
        }
    }

    /// Longest symbolic chain that will be followed
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    fn ref_path(&self, name: &str) -> PathBuf {
        self.git_dir.join(name)
    }

    fn read_loose(&self, name: &str) -> GitResult<Option<RefTarget>> {
        let path = self.ref_path(name);
        if !path.is_file() {
            return Ok(None);
        }
        match fs::read_to_string(&path) {
            Ok(content) => parse_loose(name, &content).map(Some),
            // Deleted between the check and the read.
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn read_packed(&self) -> GitResult<Vec<Reference>> {
        match fs::read_to_string(self.git_dir.join(PACKED_REFS)) {
            Ok(content) => parse_packed(&content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Reference by full name
    pub fn read(&self, name: &str) -> GitResult<Reference> {
        validate_name(name)?;
        if let Some(target) = self.read_loose(name)? {
            return Ok(Reference {
                name: name.to_string(),
                target,
                peeled: None,
            });
        }
        self.read_packed()?
            .into_iter()
            .find(|r| r.name == name)
            .ok_or_else(|| GitError::ReferenceNotFound(name.to_string()))
    }

    /// Reference by full name, `None` if absent
    pub fn find(&self, name: &str) -> GitResult<Option<Reference>> {
        match self.read(name) {
            Ok(r) => Ok(Some(r)),
            Err(GitError::ReferenceNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// True if the reference exists
    pub fn exists(&self, name: &str) -> bool {
        matches!(self.find(name), Ok(Some(_)))
    }

    /// Follow a symbolic chain to its end
    ///
    /// Returns the last name in the chain and its id, or `None` when the
    /// chain ends at a reference that doesn't exist yet (an unborn branch).
    /// Fails with `ReferenceNotFound` when `name` itself is missing and
    /// `InvalidReferenceState` on a cycle or a chain longer than the
    /// configured bound.
    pub fn follow(&self, name: &str) -> GitResult<(String, Option<Oid>)> {
        let mut current = self.read(name)?;
        let mut seen = HashSet::new();
        seen.insert(current.name.clone());
        let mut hops = 0;

        loop {
            let next = match &current.target {
                RefTarget::Direct(id) => return Ok((current.name, Some(*id))),
                RefTarget::Symbolic(next) => next.clone(),
            };
            hops += 1;
            if hops > self.max_depth {
                return Err(GitError::invalid_reference_state(
                    name,
                    format!("symbolic chain longer than {}", self.max_depth),
                ));
            }
            if !seen.insert(next.clone()) {
                return Err(GitError::invalid_reference_state(
                    name,
                    format!("symbolic reference cycle through '{}'", next),
                ));
            }
            match self.find(&next)? {
                Some(r) => current = r,
                None => return Ok((next, None)),
            }
        }
    }

    /// Object id a reference ultimately points at
    ///
    /// A chain ending at a missing reference is `InvalidReferenceState`.
    pub fn resolve(&self, name: &str) -> GitResult<Oid> {
        match self.follow(name)? {
            (_, Some(id)) => {
                debug!(reference = %name, oid = %id, "resolved reference");
                Ok(id)
            }
            (last, None) => Err(GitError::invalid_reference_state(
                name,
                format!("points at missing reference '{}'", last),
            )),
        }
    }

    fn collect_loose(&self, dir: &Path, prefix: &str, out: &mut BTreeMap<String, Reference>) -> GitResult<()> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        for entry in entries {
            let entry = entry?;
            let file_name = entry.file_name().to_string_lossy().to_string();
            let name = format!("{}/{}", prefix, file_name);
            let path = entry.path();
            if path.is_dir() {
                self.collect_loose(&path, &name, out)?;
                continue;
            }
            if validate_name(&name).is_err() {
                // Lock files and editor droppings.
                continue;
            }
            if let Some(target) = self.read_loose(&name)? {
                out.insert(
                    name.clone(),
                    Reference {
                        name,
                        target,
                        peeled: None,
                    },
                );
            }
        }
        Ok(())
    }

    /// Every reference under `refs/`, loose and packed, sorted by name
    pub fn list(&self) -> GitResult<Vec<Reference>> {
        let mut all: BTreeMap<String, Reference> = BTreeMap::new();
        for packed in self.read_packed()? {
            all.insert(packed.name.clone(), packed);
        }
        self.collect_loose(&self.git_dir.join("refs"), "refs", &mut all)?;
        Ok(all.into_values().collect())
    }

    /// References whose name starts with `prefix`
    pub fn list_prefixed(&self, prefix: &str) -> GitResult<Vec<Reference>> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|r| r.name.starts_with(prefix))
            .collect())
    }

    /// Branches
    pub fn list_branches(&self) -> GitResult<Vec<Reference>> {
        self.list_prefixed("refs/heads/")
    }

    /// Tags
    pub fn list_tags(&self) -> GitResult<Vec<Reference>> {
        self.list_prefixed("refs/tags/")
    }

    fn lock(&self, name: &str, expected: &str) -> GitResult<LockFile> {
        LockFile::acquire(self.ref_path(name), &self.lock_policy).map_err(|e| {
            if e.kind() == io::ErrorKind::AlreadyExists {
                warn!(reference = %name, "reference is locked by another writer");
                GitError::ConcurrentRefUpdate {
                    name: name.to_string(),
                    expected: expected.to_string(),
                    actual: "locked".to_string(),
                }
            } else {
                GitError::Io(e)
            }
        })
    }

    /// Point `name` at `new`, if it still holds `expected`
    ///
    /// `expected` is `None` for an unconditional update, `Some(Oid::zero())`
    /// when the reference must not exist yet, or the id it must hold. A
    /// symbolic reference is updated through to the end of its chain, so
    /// updating `HEAD` moves the checked-out branch.
    pub fn update(&self, name: &str, new: Oid, expected: Option<Oid>) -> GitResult<()> {
        validate_name(name)?;
        let target = match self.follow(name) {
            Ok((last, _)) => last,
            Err(GitError::ReferenceNotFound(_)) => name.to_string(),
            Err(e) => return Err(e),
        };
        let expected_text = expected.map_or_else(|| "any".to_string(), |id| id.to_hex());

        let mut lock = self.lock(&target, &expected_text)?;

        // Re-read under the lock.
        let current = match self.find(&target)? {
            Some(r) => match r.target {
                RefTarget::Direct(id) => Some(id),
                RefTarget::Symbolic(other) => {
                    return Err(GitError::ConcurrentRefUpdate {
                        name: target,
                        expected: expected_text,
                        actual: format!("ref: {}", other),
                    })
                }
            },
            None => None,
        };

        if let Some(expected) = expected {
            let matches = match current {
                Some(id) => id == expected,
                None => expected.is_zero(),
            };
            if !matches {
                return Err(GitError::ConcurrentRefUpdate {
                    name: target,
                    expected: expected_text,
                    actual: current.map_or_else(|| "missing".to_string(), |id| id.to_hex()),
                });
            }
        }

        lock.write_all(format!("{}\n", new.to_hex()).as_bytes())?;
        lock.commit()?;
        info!(
            reference = %target,
            old = %current.map_or_else(|| "none".to_string(), |id| id.to_hex()),
            new = %new,
            "updated reference"
        );
        Ok(())
    }

    /// Make `name` a symbolic reference to `target`
    pub fn update_symbolic(&self, name: &str, target: &str) -> GitResult<()> {
        validate_name(name)?;
        validate_name(target)?;
        if name == target {
            return Err(GitError::invalid_reference_state(name, "cannot point at itself"));
        }
        let mut lock = self.lock(name, "any")?;
        lock.write_all(format!("{}{}\n", SYMREF_PREFIX, target).as_bytes())?;
        lock.commit()?;
        info!(reference = %name, target = %target, "updated symbolic reference");
        Ok(())
    }

    fn rewrite_packed_without(&self, name: &str) -> GitResult<bool> {
        let path = self.git_dir.join(PACKED_REFS);
        let mut lock = self.lock(PACKED_REFS, "any")?;
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };

        let mut kept = String::with_capacity(content.len());
        let mut removed = false;
        let mut skipping = false;
        for line in content.lines() {
            if line.starts_with('^') {
                if !skipping {
                    kept.push_str(line);
                    kept.push('\n');
                }
                continue;
            }
            skipping = !line.starts_with('#')
                && line.split_once(' ').map(|(_, n)| n.trim()) == Some(name);
            if skipping {
                removed = true;
            } else {
                kept.push_str(line);
                kept.push('\n');
            }
        }

        if removed {
            lock.write_all(kept.as_bytes())?;
            lock.commit()?;
        }
        Ok(removed)
    }

    /// Remove a reference, loose and packed
    pub fn delete(&self, name: &str) -> GitResult<()> {
        validate_name(name)?;
        let path = self.ref_path(name);
        let lock = self.lock(name, "any")?;

        let loose_removed = match fs::remove_file(&path) {
            Ok(()) => true,
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(e) => return Err(e.into()),
        };
        let packed_removed = self.rewrite_packed_without(name)?;
        drop(lock);

        if !loose_removed && !packed_removed {
            return Err(GitError::ReferenceNotFound(name.to_string()));
        }
        info!(reference = %name, "deleted reference");
        Ok(())
    }

    /// Rename a reference, moving `HEAD` along if it pointed at `old`
    pub fn rename(&self, old: &str, new: &str, force: bool) -> GitResult<Reference> {
        validate_name(new)?;
        let existing = self.read(old)?;
        if old == new {
            return Ok(existing);
        }
        if !force && self.exists(new) {
            return Err(GitError::ReferenceExists(new.to_string()));
        }

        match existing.target() {
            RefTarget::Direct(id) => {
                let expected = if force { None } else { Some(Oid::zero()) };
                self.update(new, *id, expected)?;
            }
            RefTarget::Symbolic(target) => self.update_symbolic(new, target)?,
        }
        self.delete(old)?;

        if let Ok(Some(head)) = self.find("HEAD") {
            if head.symbolic_target() == Some(old) {
                self.update_symbolic("HEAD", new)?;
            }
        }
        info!(from = %old, to = %new, "renamed reference");
        self.read(new)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const A: &str = "8496071c1b46c854b31185ea97743be6a8774479";
    const B: &str = "5b5b025afb0b4c913b4c338a42934a3863bf3644";

    fn oid(hex: &str) -> Oid {
        Oid::from_hex(hex).unwrap()
    }

    fn refdb() -> (RefDatabase, TempDir) {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("refs/heads")).unwrap();
        fs::create_dir_all(temp.path().join("refs/tags")).unwrap();
        fs::write(temp.path().join("HEAD"), "ref: refs/heads/master\n").unwrap();
        (RefDatabase::new(temp.path()), temp)
    }

    #[test]
    fn test_name_validation() {
        for good in [
            "HEAD",
            "ORIG_HEAD",
            "refs/heads/master",
            "refs/heads/feature/login",
            "refs/tags/v1.0",
            "refs/heads/a-b_c",
        ] {
            assert!(validate_name(good).is_ok(), "{} should be valid", good);
        }
        for bad in [
            "",
            "@",
            "master",
            "heads/master",
            "refs/heads/a..b",
            "refs/heads/.hidden",
            "refs/heads/x.lock",
            "refs/heads/trailing/",
            "refs//heads",
            "refs/heads/dot.",
            "refs/heads/at@{1}",
            "refs/heads/sp ace",
            "refs/heads/ti~lde",
            "refs/heads/ca^ret",
            "refs/heads/co:lon",
            "refs/heads/q?",
            "refs/heads/st*r",
            "refs/heads/br[cket",
            "refs/heads/back\\slash",
            "refs/heads/ctl\x07",
        ] {
            assert!(
                matches!(validate_name(bad), Err(GitError::InvalidFormat(_))),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_unborn_head() {
        let (refs, _temp) = refdb();
        let head = refs.read("HEAD").unwrap();
        assert_eq!(head.symbolic_target(), Some("refs/heads/master"));
        assert_eq!(
            refs.follow("HEAD").unwrap(),
            ("refs/heads/master".to_string(), None)
        );
        assert!(matches!(
            refs.resolve("HEAD"),
            Err(GitError::InvalidReferenceState { .. })
        ));
    }

    #[test]
    fn test_update_through_head_creates_branch() {
        let (refs, temp) = refdb();
        refs.update("HEAD", oid(A), Some(Oid::zero())).unwrap();
        assert_eq!(
            fs::read_to_string(temp.path().join("refs/heads/master")).unwrap(),
            format!("{}\n", A)
        );
        assert_eq!(refs.resolve("HEAD").unwrap(), oid(A));
        assert!(refs.read("HEAD").unwrap().symbolic_target().is_some());
    }

    #[test]
    fn test_compare_and_swap() {
        let (refs, _temp) = refdb();
        refs.update("refs/heads/master", oid(A), None).unwrap();

        let err = refs
            .update("refs/heads/master", oid(B), Some(Oid::zero()))
            .unwrap_err();
        assert!(matches!(err, GitError::ConcurrentRefUpdate { .. }));

        let err = refs
            .update("refs/heads/master", oid(B), Some(oid(B)))
            .unwrap_err();
        assert!(matches!(err, GitError::ConcurrentRefUpdate { .. }));

        refs.update("refs/heads/master", oid(B), Some(oid(A))).unwrap();
        assert_eq!(refs.resolve("refs/heads/master").unwrap(), oid(B));
    }

    #[test]
    fn test_held_lock_surfaces_as_concurrent_update() {
        let (refs, temp) = refdb();
        fs::write(temp.path().join("refs/heads/master.lock"), "").unwrap();
        let refs = RefDatabase::with_config(
            temp.path(),
            &RefsConfig {
                lock_retries: 2,
                lock_backoff_ms: 1,
                ..RefsConfig::default()
            },
        );
        let err = refs.update("refs/heads/master", oid(A), None).unwrap_err();
        match err {
            GitError::ConcurrentRefUpdate { actual, .. } => assert_eq!(actual, "locked"),
            other => panic!("unexpected {:?}", other),
        }
        // The foreign lock is left alone.
        assert!(temp.path().join("refs/heads/master.lock").exists());
    }

    #[test]
    fn test_symbolic_cycle_and_depth() {
        let (refs, temp) = refdb();
        fs::write(temp.path().join("refs/heads/a"), "ref: refs/heads/b\n").unwrap();
        fs::write(temp.path().join("refs/heads/b"), "ref: refs/heads/a\n").unwrap();
        assert!(matches!(
            refs.resolve("refs/heads/a"),
            Err(GitError::InvalidReferenceState { .. })
        ));

        for i in 0..7 {
            fs::write(
                temp.path().join(format!("refs/heads/c{}", i)),
                format!("ref: refs/heads/c{}\n", i + 1),
            )
            .unwrap();
        }
        fs::write(temp.path().join("refs/heads/c7"), format!("{}\n", A)).unwrap();
        assert!(matches!(
            refs.resolve("refs/heads/c0"),
            Err(GitError::InvalidReferenceState { .. })
        ));
        // Within the bound of 5 hops.
        assert_eq!(refs.resolve("refs/heads/c3").unwrap(), oid(A));
    }

    #[test]
    fn test_packed_refs_lookup_and_shadowing() {
        let (refs, temp) = refdb();
        fs::write(
            temp.path().join(PACKED_REFS),
            format!(
                "# pack-refs with: peeled fully-peeled sorted \n\
                 {a} refs/heads/packed\n\
                 {b} refs/tags/v1.0\n\
                 ^{a}\n\
                 {a} refs/heads/master\n",
                a = A,
                b = B
            ),
        )
        .unwrap();
        fs::write(temp.path().join("refs/heads/master"), format!("{}\n", B)).unwrap();

        let tag = refs.read("refs/tags/v1.0").unwrap();
        assert_eq!(tag.id(), Some(oid(B)));
        assert_eq!(tag.peeled(), Some(oid(A)));
        assert_eq!(refs.resolve("refs/heads/master").unwrap(), oid(B));

        let names: Vec<String> = refs.list().unwrap().iter().map(|r| r.name().to_string()).collect();
        assert_eq!(names, ["refs/heads/master", "refs/heads/packed", "refs/tags/v1.0"]);
        assert_eq!(refs.list_tags().unwrap().len(), 1);
        assert_eq!(refs.list_branches().unwrap().len(), 2);
    }

    #[test]
    fn test_delete_packed_ref_rewrites_file() {
        let (refs, temp) = refdb();
        fs::write(
            temp.path().join(PACKED_REFS),
            format!("{a} refs/tags/v1.0\n^{b}\n{a} refs/tags/v2.0\n", a = A, b = B),
        )
        .unwrap();
        refs.delete("refs/tags/v1.0").unwrap();

        let content = fs::read_to_string(temp.path().join(PACKED_REFS)).unwrap();
        assert_eq!(content, format!("{} refs/tags/v2.0\n", A));
        assert!(!refs.exists("refs/tags/v1.0"));
        assert!(matches!(
            refs.delete("refs/tags/v1.0"),
            Err(GitError::ReferenceNotFound(_))
        ));
    }

    #[test]
    fn test_rename_moves_head() {
        let (refs, _temp) = refdb();
        refs.update("refs/heads/master", oid(A), None).unwrap();
        let renamed = refs.rename("refs/heads/master", "refs/heads/main", false).unwrap();
        assert_eq!(renamed.id(), Some(oid(A)));
        assert!(!refs.exists("refs/heads/master"));
        assert_eq!(refs.read("HEAD").unwrap().symbolic_target(), Some("refs/heads/main"));

        refs.update("refs/heads/other", oid(B), None).unwrap();
        assert!(matches!(
            refs.rename("refs/heads/other", "refs/heads/main", false),
            Err(GitError::ReferenceExists(_))
        ));
        refs.rename("refs/heads/other", "refs/heads/main", true).unwrap();
        assert_eq!(refs.resolve("refs/heads/main").unwrap(), oid(B));
    }

    #[test]
    fn test_corrupt_loose_ref() {
        let (refs, temp) = refdb();
        fs::write(temp.path().join("refs/heads/master"), "garbage\n").unwrap();
        assert!(refs.read("refs/heads/master").unwrap_err().is_corrupt());
    }

    #[test]
    fn test_detached_head_and_short_names() {
        let (refs, temp) = refdb();
        fs::write(temp.path().join("HEAD"), format!("{}\n", A)).unwrap();
        assert_eq!(refs.resolve("HEAD").unwrap(), oid(A));
        assert_eq!(Reference::direct("refs/tags/v1.0", oid(A)).short_name(), "v1.0");
        assert_eq!(Reference::direct("HEAD", oid(A)).short_name(), "HEAD");
    }
}
