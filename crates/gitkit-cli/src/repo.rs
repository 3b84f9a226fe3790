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

//! Repository discovery for CLI commands.

use anyhow::{bail, Context, Result};
use gitkit_versioning::{GitError, Repository};
use std::path::{Path, PathBuf};

/// Global options every command runs under
#[derive(Debug, Clone)]
pub struct RepoContext {
    directory: Option<PathBuf>,
    quiet: bool,
}

impl RepoContext {
    pub fn new(directory: Option<PathBuf>, quiet: bool) -> Self {
        Self { directory, quiet }
    }

    /// Whether status messages are suppressed
    pub fn quiet(&self) -> bool {
        self.quiet
    }

    /// Directory the command acts in: `-C` resolved against the cwd
    pub fn start_dir(&self) -> Result<PathBuf> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;
        Ok(match &self.directory {
            Some(dir) => cwd.join(dir),
            None => cwd,
        })
    }

    /// Resolve `path` relative to the start directory
    pub fn resolve_path(&self, path: &Path) -> Result<PathBuf> {
        Ok(self.start_dir()?.join(path))
    }

    /// Open the repository containing the start directory
    pub fn open(&self) -> Result<Repository> {
        discover(&self.start_dir()?)
    }
}

/// Find the repository at `start` or in one of its parents.
///
/// A parent that exists but fails to open for another reason (corrupt
/// config, unreadable files) stops the search with that error.
pub fn discover(start: &Path) -> Result<Repository> {
    let start = start
        .canonicalize()
        .with_context(|| format!("Cannot access {}", start.display()))?;
    let mut current = start.clone();

    loop {
        match Repository::open(&current) {
            Ok(repo) => return Ok(repo),
            Err(GitError::NotARepository(_)) => {}
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to open repository at {}", current.display()))
            }
        }

        if !current.pop() {
            bail!(
                "not a git repository (or any of the parent directories): {}",
                start.display()
            );
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_discover_from_nested_dir() {
        let temp = TempDir::new().unwrap();
        Repository::init(temp.path(), false).unwrap();

        let nested = temp.path().join("src").join("commands");
        std::fs::create_dir_all(&nested).unwrap();

        let repo = discover(&nested).unwrap();
        assert_eq!(repo.workdir(), Some(temp.path().canonicalize().unwrap().as_path()));
    }

    #[test]
    fn test_discover_not_found() {
        let temp = TempDir::new().unwrap();
        let err = discover(temp.path()).unwrap_err();
        assert!(err.to_string().contains("not a git repository"));
    }

    #[test]
    fn test_context_directory_is_relative_to_cwd() {
        let ctx = RepoContext::new(Some(PathBuf::from("sub")), false);
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(ctx.start_dir().unwrap(), cwd.join("sub"));
    }
}
