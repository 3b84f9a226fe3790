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

//! Repository façade
//!
//! A `Repository` owns the object and reference databases of one git
//! directory. It is open from construction until `close` (or drop); after
//! `close` every operation fails with `UseAfterDispose`, and walkers created
//! from it stop working too.
//!
//! # Examples
//!
//! ```
//! use gitkit_versioning::{ObjectType, Repository};
//!
//! let temp = tempfile::tempdir().unwrap();
//! let repo = Repository::init(temp.path(), false).unwrap();
//! let id = repo.write_blob(b"hey there\n").unwrap();
//! assert_eq!(repo.read_header(&id).unwrap().kind, ObjectType::Blob);
//!
//! repo.close();
//! assert!(repo.exists(&id).is_err());
//! ```

use crate::commit::Commit;
use crate::error::{GitError, GitResult};
use crate::index::{Index, IndexEntry};
use crate::metrics::OdbMetrics;
use crate::object::{Blob, GitObject, ObjectBody, ObjectType};
use crate::odb::ObjectDatabase;
use crate::oid::Oid;
use crate::raw::{Header, RawObject};
use crate::refs::{validate_name, RefDatabase, Reference};
use crate::revision::{peel, resolve_revision};
use crate::revwalk::RevisionWalker;
use crate::signature::Signature;
use crate::tag::Tag;
use crate::tree::Tree;
use gitkit_config::Config;
use gitkit_storage::LocalBackend;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{debug, info, instrument};

const GITDIR_PREFIX: &str = "gitdir:";
const DESCRIPTION: &str = "Unnamed repository; edit this file 'description' to name the repository.\n";

/// Handles released on close
struct Inner {
    odb: Arc<ObjectDatabase>,
    refs: Arc<RefDatabase>,
    config: Config,
}

/// An open Git repository
pub struct Repository {
    git_dir: PathBuf,
    workdir: Option<PathBuf>,
    inner: RwLock<Option<Inner>>,
}

fn is_git_dir(path: &Path) -> bool {
    path.join("HEAD").is_file() && path.join("objects").is_dir() && path.join("refs").is_dir()
}

/// Git dir named by a `.git` file (`gitdir: <path>`)
fn read_gitdir_file(dot_git: &Path) -> GitResult<PathBuf> {
    let content = fs::read_to_string(dot_git)?;
    let target = content
        .lines()
        .next()
        .and_then(|line| line.strip_prefix(GITDIR_PREFIX))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| GitError::invalid_format(format!("{} is not a gitdir file", dot_git.display())))?;
    let target = Path::new(target);
    Ok(match dot_git.parent() {
        Some(parent) if target.is_relative() => parent.join(target),
        _ => target.to_path_buf(),
    })
}

/// Git dir and work tree for a path given to `open`
fn locate(path: &Path) -> GitResult<(PathBuf, Option<PathBuf>)> {
    let dot_git = path.join(".git");
    if dot_git.is_dir() {
        return Ok((dot_git, Some(path.to_path_buf())));
    }
    if dot_git.is_file() {
        return Ok((read_gitdir_file(&dot_git)?, Some(path.to_path_buf())));
    }
    let workdir = match path.file_name() {
        Some(name) if name == ".git" => path.parent().map(Path::to_path_buf),
        _ => None,
    };
    Ok((path.to_path_buf(), workdir))
}

fn git_ini_config(bare: bool) -> String {
    let mut out = String::from("[core]\n\trepositoryformatversion = 0\n\tfilemode = true\n");
    out.push_str(&format!("\tbare = {}\n", bare));
    if !bare {
        out.push_str("\tlogallrefupdates = true\n");
    }
    out
}

impl Repository {
    /// Open an existing repository: a git dir, or a work tree with `.git`
    ///
    /// Settings come from `<gitdir>/gitkit.toml` and `GITKIT_*` variables.
    pub fn open(path: impl AsRef<Path>) -> GitResult<Self> {
        let path = path.as_ref();
        let (git_dir, _) = locate(path)?;
        if !is_git_dir(&git_dir) {
            return Err(GitError::NotARepository(path.to_path_buf()));
        }
        let config = Config::load(&git_dir)?;
        Self::open_with_config(path, config)
    }

    /// Open with explicit settings, ignoring `gitkit.toml`
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open_with_config(path: impl AsRef<Path>, config: Config) -> GitResult<Self> {
        let path = path.as_ref();
        let (git_dir, workdir) = locate(path)?;
        if !is_git_dir(&git_dir) {
            return Err(GitError::NotARepository(path.to_path_buf()));
        }

        let storage = Arc::new(LocalBackend::open_existing(git_dir.join("objects"))?);
        let odb = Arc::new(ObjectDatabase::from_config(storage, &config.odb)?);
        let refs = Arc::new(RefDatabase::with_config(&git_dir, &config.refs));

        info!(git_dir = %git_dir.display(), bare = workdir.is_none(), "opened repository");
        Ok(Repository {
            git_dir,
            workdir,
            inner: RwLock::new(Some(Inner { odb, refs, config })),
        })
    }

    /// Create a repository at `path` (`path/.git` unless `bare`)
    pub fn init(path: impl AsRef<Path>, bare: bool) -> GitResult<Self> {
        let path = path.as_ref();
        let git_dir = if bare { path.to_path_buf() } else { path.join(".git") };
        let config = Config::load(&git_dir)?;
        Self::init_with_config(path, bare, config)
    }

    /// Create a repository with explicit settings
    #[instrument(skip(path, config), fields(path = %path.as_ref().display()))]
    pub fn init_with_config(path: impl AsRef<Path>, bare: bool, config: Config) -> GitResult<Self> {
        let path = path.as_ref();
        let git_dir = if bare { path.to_path_buf() } else { path.join(".git") };
        if git_dir.join("HEAD").exists() || (!bare && path.join(".git").is_file()) {
            return Err(GitError::AlreadyExists(git_dir));
        }

        let head_target = format!("refs/heads/{}", config.core.default_branch);
        validate_name(&head_target)?;

        for dir in ["objects/info", "objects/pack", "refs/heads", "refs/tags"] {
            fs::create_dir_all(git_dir.join(dir))?;
        }
        fs::write(git_dir.join("config"), git_ini_config(bare))?;
        fs::write(git_dir.join("description"), DESCRIPTION)?;
        fs::write(git_dir.join("HEAD"), format!("ref: {}\n", head_target))?;

        info!(
            git_dir = %git_dir.display(),
            bare,
            branch = %config.core.default_branch,
            "initialized repository"
        );
        Self::open_with_config(&git_dir, config)
    }

    fn with_inner<T>(&self, f: impl FnOnce(&Inner) -> GitResult<T>) -> GitResult<T> {
        let guard = self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        match guard.as_ref() {
            Some(inner) => f(inner),
            None => Err(GitError::UseAfterDispose),
        }
    }

    /// Release the databases; later calls fail with `UseAfterDispose`
    ///
    /// Closing twice is a no-op.
    pub fn close(&self) {
        let mut guard = self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(inner) = guard.take() {
            let metrics = inner.odb.metrics();
            info!(
                git_dir = %self.git_dir.display(),
                cache_hits = metrics.cache_hits,
                cache_misses = metrics.cache_misses,
                objects_written = metrics.unique_objects,
                "closed repository"
            );
        }
    }

    /// True once `close` was called
    pub fn is_closed(&self) -> bool {
        self.inner
            .read()
            .map(|guard| guard.is_none())
            .unwrap_or(true)
    }

    /// The git directory
    pub fn path(&self) -> &Path {
        &self.git_dir
    }

    /// Work tree root; `None` for a bare repository
    pub fn workdir(&self) -> Option<&Path> {
        self.workdir.as_deref()
    }

    /// True without a work tree
    pub fn is_bare(&self) -> bool {
        self.workdir.is_none()
    }

    /// Settings the repository was opened with
    pub fn config(&self) -> GitResult<Config> {
        self.with_inner(|inner| Ok(inner.config.clone()))
    }

    /// Reference database handle
    pub fn refs(&self) -> GitResult<Arc<RefDatabase>> {
        self.with_inner(|inner| Ok(Arc::clone(&inner.refs)))
    }

    /// Object database counters
    pub fn metrics(&self) -> GitResult<OdbMetrics> {
        self.with_inner(|inner| Ok(inner.odb.metrics()))
    }

    /// True if the object is stored
    pub fn exists(&self, id: &Oid) -> GitResult<bool> {
        self.with_inner(|inner| Ok(inner.odb.exists(id)))
    }

    /// Type and length of a stored object, verified against its id
    pub fn read_header(&self, id: &Oid) -> GitResult<Header> {
        self.with_inner(|inner| inner.odb.read_header(id))
    }

    /// Full inflated object
    pub fn read(&self, id: &Oid) -> GitResult<RawObject> {
        self.with_inner(|inner| inner.odb.read(id))
    }

    /// Typed object, if present and of the expected type
    ///
    /// An absent id or a type mismatch is `Ok(None)`; corruption is an
    /// error.
    #[instrument(skip(self, id), fields(id = %id))]
    pub fn lookup(&self, id: &Oid, expected: Option<ObjectType>) -> GitResult<Option<GitObject>> {
        self.with_inner(|inner| {
            if let Some(kind) = expected {
                match inner.odb.read_header(id) {
                    Ok(header) if header.kind != kind => {
                        debug!(actual = %header.kind, expected = %kind, "type mismatch");
                        return Ok(None);
                    }
                    Ok(_) => {}
                    Err(GitError::ObjectNotFound(_)) => return Ok(None),
                    Err(e) => return Err(e),
                }
            }
            match inner.odb.read_object(id) {
                Ok(object) => Ok(Some(object)),
                Err(GitError::ObjectNotFound(_)) => Ok(None),
                Err(e) => Err(e),
            }
        })
    }

    /// Commit by id
    pub fn lookup_commit(&self, id: &Oid) -> GitResult<Option<Commit>> {
        Ok(self
            .lookup(id, Some(ObjectType::Commit))?
            .and_then(GitObject::into_commit))
    }

    /// Tree by id
    pub fn lookup_tree(&self, id: &Oid) -> GitResult<Option<Tree>> {
        Ok(self
            .lookup(id, Some(ObjectType::Tree))?
            .and_then(GitObject::into_tree))
    }

    /// Blob by id
    pub fn lookup_blob(&self, id: &Oid) -> GitResult<Option<Blob>> {
        Ok(self
            .lookup(id, Some(ObjectType::Blob))?
            .and_then(GitObject::into_blob))
    }

    /// Annotated tag by id
    pub fn lookup_tag(&self, id: &Oid) -> GitResult<Option<Tag>> {
        Ok(self
            .lookup(id, Some(ObjectType::Tag))?
            .and_then(GitObject::into_tag))
    }

    /// Id a revision names, e.g. `HEAD~2`, `v1.0^{}` or `8496071`
    #[instrument(skip(self))]
    pub fn rev_parse(&self, spec: &str) -> GitResult<Oid> {
        self.with_inner(|inner| resolve_revision(spec, &inner.refs, &inner.odb))
    }

    /// Object a revision names, `None` if nothing matches
    pub fn resolve(&self, spec: &str) -> GitResult<Option<GitObject>> {
        match self.rev_parse(spec) {
            Ok(id) => self.lookup(&id, None),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Peel tags (and commits, for `Tree`) until reaching `kind`
    pub fn peel(&self, id: &Oid, kind: Option<ObjectType>) -> GitResult<Oid> {
        self.with_inner(|inner| peel(&inner.odb, *id, kind))
    }

    /// The `HEAD` reference itself
    pub fn head(&self) -> GitResult<Reference> {
        self.with_inner(|inner| inner.refs.read("HEAD"))
    }

    /// Commit `HEAD` points at; `None` on an unborn branch
    pub fn head_id(&self) -> GitResult<Option<Oid>> {
        self.with_inner(|inner| Ok(inner.refs.follow("HEAD")?.1))
    }

    /// All references, loose and packed, sorted by name
    pub fn references(&self) -> GitResult<Vec<Reference>> {
        self.with_inner(|inner| inner.refs.list())
    }

    /// Reference by full name
    pub fn find_reference(&self, name: &str) -> GitResult<Option<Reference>> {
        self.with_inner(|inner| inner.refs.find(name))
    }

    /// Compare-and-swap update; see [`RefDatabase::update`]
    pub fn update_reference(&self, name: &str, new: Oid, expected: Option<Oid>) -> GitResult<()> {
        self.with_inner(|inner| inner.refs.update(name, new, expected))
    }

    /// Point `name` at another reference
    pub fn set_symbolic_reference(&self, name: &str, target: &str) -> GitResult<()> {
        self.with_inner(|inner| inner.refs.update_symbolic(name, target))
    }

    /// Remove a reference
    pub fn delete_reference(&self, name: &str) -> GitResult<()> {
        self.with_inner(|inner| inner.refs.delete(name))
    }

    /// Rename a reference
    pub fn rename_reference(&self, old: &str, new: &str, force: bool) -> GitResult<Reference> {
        self.with_inner(|inner| inner.refs.rename(old, new, force))
    }

    /// Store raw bytes of any type
    pub fn write(&self, kind: ObjectType, data: &[u8]) -> GitResult<Oid> {
        self.with_inner(|inner| inner.odb.write(kind, data))
    }

    /// Store a blob
    pub fn write_blob(&self, content: &[u8]) -> GitResult<Oid> {
        self.write(ObjectType::Blob, content)
    }

    /// Store a tree
    pub fn write_tree(&self, tree: &Tree) -> GitResult<Oid> {
        self.with_inner(|inner| inner.odb.write_object(&ObjectBody::Tree(tree.clone())))
    }

    /// Signature from `core.user_name` / `core.user_email`, stamped now
    pub fn default_signature(&self) -> GitResult<Signature> {
        self.with_inner(|inner| {
            let core = &inner.config.core;
            match (&core.user_name, &core.user_email) {
                (Some(name), Some(email)) => Signature::now(name.as_str(), email.as_str()),
                _ => Err(GitError::invalid_format(
                    "core.user_name and core.user_email must be set",
                )),
            }
        })
    }

    fn require_kind(inner: &Inner, id: &Oid, kind: ObjectType) -> GitResult<()> {
        let header = inner.odb.read_header(id)?;
        if header.kind != kind {
            return Err(GitError::invalid_format(format!(
                "{} is a {}, expected a {}",
                id, header.kind, kind
            )));
        }
        Ok(())
    }

    /// Write a commit and, if `update_ref` is given, move that reference
    ///
    /// The reference must still hold the first parent (or not exist for a
    /// root commit); otherwise the commit is written but the update fails
    /// with `ConcurrentRefUpdate`.
    #[instrument(skip_all, fields(tree = %tree, update_ref = ?update_ref))]
    pub fn create_commit(
        &self,
        update_ref: Option<&str>,
        author: &Signature,
        committer: &Signature,
        message: &str,
        tree: &Oid,
        parents: &[Oid],
    ) -> GitResult<Oid> {
        self.with_inner(|inner| {
            Self::require_kind(inner, tree, ObjectType::Tree)?;
            for parent in parents {
                Self::require_kind(inner, parent, ObjectType::Commit)?;
            }
            let commit = Commit::new(
                *tree,
                parents.to_vec(),
                author.clone(),
                committer.clone(),
                message,
            );
            let id = inner.odb.write_object(&ObjectBody::Commit(commit))?;

            if let Some(name) = update_ref {
                let expected = parents.first().copied().unwrap_or_else(Oid::zero);
                inner.refs.update(name, id, Some(expected))?;
            }
            info!(commit = %id, parents = parents.len(), "created commit");
            Ok(id)
        })
    }

    /// Write an annotated tag and create `refs/tags/<name>`
    #[instrument(skip_all, fields(name = %name, target = %target))]
    pub fn create_tag(
        &self,
        name: &str,
        target: &Oid,
        tagger: &Signature,
        message: &str,
        force: bool,
    ) -> GitResult<Oid> {
        let ref_name = format!("refs/tags/{}", name);
        validate_name(&ref_name)?;
        self.with_inner(|inner| {
            if !force && inner.refs.exists(&ref_name) {
                return Err(GitError::ReferenceExists(ref_name.clone()));
            }
            let target_type = inner.odb.read_header(target)?.kind;
            let tag = Tag::new(*target, target_type, name, tagger.clone(), message);
            let id = inner.odb.write_object(&ObjectBody::Tag(tag))?;
            let expected = if force { None } else { Some(Oid::zero()) };
            inner.refs.update(&ref_name, id, expected)?;
            info!(tag = %name, id = %id, "created tag");
            Ok(id)
        })
    }

    /// The staging area, empty if there is no `index` file yet
    pub fn index(&self) -> GitResult<Index> {
        self.with_inner(|_| Index::open(self.git_dir.join("index")))
    }

    /// Hash a work-tree file into the object store and stage it
    #[instrument(skip(self))]
    pub fn add_to_index(&self, path: &str) -> GitResult<IndexEntry> {
        let workdir = self
            .workdir
            .as_deref()
            .ok_or_else(|| GitError::invalid_format("a bare repository has no work tree"))?;
        let content = fs::read(workdir.join(path))?;
        let id = self.write_blob(&content)?;
        let entry = IndexEntry::from_file(workdir, path, id)?;

        let mut index = self.index()?;
        index.add(entry.clone())?;
        index.write()?;
        Ok(entry)
    }

    /// Revision walker over this repository's commits
    ///
    /// The walker fails with `UseAfterDispose` once the repository closes.
    pub fn revwalk(&self) -> GitResult<RevisionWalker> {
        self.with_inner(|inner| Ok(RevisionWalker::new(&inner.odb)))
    }
}

impl Drop for Repository {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("git_dir", &self.git_dir)
            .field("workdir", &self.workdir)
            .field("closed", &self.is_closed())
            .finish()
    }
}
