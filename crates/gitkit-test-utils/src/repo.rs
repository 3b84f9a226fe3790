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

//! Test repository helper for integration tests.
//!
//! A `TestRepo` is a temporary directory that can be given a Git layout
//! without going through gitkit, so the library and the CLI can be tested
//! against repositories they didn't create.

use crate::cli::GitkitCommand;
use crate::fixtures::{deflate, loose_bytes, object_id, Fixture};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A test repository with automatic cleanup.
///
/// # Example
/// ```
/// use gitkit_test_utils::{TestFixtures, TestRepo};
///
/// let repo = TestRepo::with_git_layout();
/// repo.install_fixture(&TestFixtures::TESTING_COMMIT);
/// assert!(repo.git_dir().join("objects/84").is_dir());
/// ```
pub struct TestRepo {
    temp_dir: TempDir,
    bare: bool,
}

impl TestRepo {
    /// Create a new empty test directory (not initialized as a repo).
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
            bare: false,
        }
    }

    /// Create a new test directory and run `gitkit init -q` in it.
    ///
    /// Only usable from tests of the `gitkit-cli` package.
    pub fn initialized() -> Self {
        let repo = Self::new();
        GitkitCommand::init_quiet(repo.path());
        repo
    }

    /// A work tree with a hand-made `.git` on `refs/heads/master`
    pub fn with_git_layout() -> Self {
        let repo = Self::new();
        repo.create_layout(&repo.path().join(".git"));
        repo
    }

    /// A bare repository laid out directly in the temp directory
    pub fn bare_layout() -> Self {
        let mut repo = Self::new();
        repo.bare = true;
        repo.create_layout(repo.path());
        repo
    }

    fn create_layout(&self, git_dir: &Path) {
        for dir in ["objects/info", "objects/pack", "refs/heads", "refs/tags"] {
            fs::create_dir_all(git_dir.join(dir)).expect("Failed to create git directories");
        }
        fs::write(git_dir.join("HEAD"), "ref: refs/heads/master\n").expect("Failed to write HEAD");
        fs::write(
            git_dir.join("config"),
            format!(
                "[core]\n\trepositoryformatversion = 0\n\tbare = {}\n",
                self.bare
            ),
        )
        .expect("Failed to write config");
    }

    /// Get the path to the repository directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Get the path to the git directory.
    pub fn git_dir(&self) -> PathBuf {
        if self.bare {
            self.temp_dir.path().to_path_buf()
        } else {
            self.temp_dir.path().join(".git")
        }
    }

    /// Store an object the way Git does; returns its hex id.
    pub fn install_loose_object(&self, kind: &str, content: &[u8]) -> String {
        let id = object_id(kind, content);
        self.install_raw_object(&id, &deflate(&loose_bytes(kind, content)));
        id
    }

    /// Store a fixture object.
    pub fn install_fixture(&self, fixture: &Fixture) {
        let id = self.install_loose_object(fixture.kind, fixture.content);
        assert_eq!(id, fixture.id, "fixture id drifted");
    }

    /// Write arbitrary bytes at the loose path of `id` (for corruption tests).
    pub fn install_raw_object(&self, id: &str, bytes: &[u8]) {
        let path = self.object_path(id);
        fs::create_dir_all(path.parent().expect("object path has a parent"))
            .expect("Failed to create fan-out directory");
        fs::write(&path, bytes).expect("Failed to write object");
    }

    /// `objects/ab/cdef…` for a hex id
    pub fn object_path(&self, id: &str) -> PathBuf {
        let (dir, file) = id.split_at(2);
        self.git_dir().join("objects").join(dir).join(file)
    }

    /// Write a loose ref: either a hex id or `ref: <target>`.
    pub fn write_ref(&self, name: &str, value: &str) {
        let path = self.git_dir().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create ref directories");
        }
        fs::write(&path, format!("{}\n", value)).expect("Failed to write ref");
    }

    /// Write a `packed-refs` file from `(id, name)` pairs.
    pub fn write_packed_refs(&self, refs: &[(&str, &str)]) {
        let mut content = String::from("# pack-refs with: peeled fully-peeled sorted \n");
        for (id, name) in refs {
            content.push_str(&format!("{} {}\n", id, name));
        }
        fs::write(self.git_dir().join("packed-refs"), content).expect("Failed to write packed-refs");
    }

    /// Write a file to the repository.
    pub fn write_file(&self, name: &str, content: &[u8]) {
        let path = self.temp_dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        fs::write(&path, content).expect("Failed to write file");
    }

    /// Read a file from the repository.
    pub fn read_file(&self, name: &str) -> Vec<u8> {
        fs::read(self.temp_dir.path().join(name)).expect("Failed to read file")
    }

    /// Read a text file from the repository.
    pub fn read_text_file(&self, name: &str) -> String {
        fs::read_to_string(self.temp_dir.path().join(name)).expect("Failed to read text file")
    }

    /// Check if a file exists in the repository.
    pub fn file_exists(&self, name: &str) -> bool {
        self.temp_dir.path().join(name).exists()
    }

    /// Get the path to a file in the repository.
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }
}

impl Default for TestRepo {
    fn default() -> Self {
        Self::new()
    }
}
