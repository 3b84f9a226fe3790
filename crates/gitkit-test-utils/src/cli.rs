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

//! CLI command helpers for testing the gitkit binary.
//!
//! Provides convenient wrappers around assert_cmd. `cargo_bin` resolves
//! binaries of the package under test, so these only work from
//! `gitkit-cli`'s own tests.

use assert_cmd::Command;
use std::path::Path;

/// Creates a new gitkit Command for testing.
///
/// `GITKIT_*` settings from the caller's environment are cleared.
///
/// # Example
/// ```ignore
/// use gitkit_test_utils::gitkit;
///
/// gitkit()
///     .arg("init")
///     .current_dir(temp_dir.path())
///     .assert()
///     .success();
/// ```
#[allow(deprecated)] // cargo_bin is deprecated but still works for our use case
pub fn gitkit() -> Command {
    let mut cmd = Command::cargo_bin("gitkit").expect("gitkit binary not found");
    for (key, _) in std::env::vars() {
        if key.starts_with("GITKIT_") {
            cmd.env_remove(key);
        }
    }
    cmd.env("NO_COLOR", "1");
    cmd
}

/// Fluent API wrapper for common gitkit command patterns.
pub struct GitkitCommand {
    cmd: Command,
}

impl GitkitCommand {
    /// Create a new GitkitCommand.
    pub fn new() -> Self {
        Self { cmd: gitkit() }
    }

    /// Set the working directory for the command.
    pub fn in_dir(mut self, dir: &Path) -> Self {
        self.cmd.current_dir(dir);
        self
    }

    /// Add an argument to the command.
    pub fn arg(mut self, arg: &str) -> Self {
        self.cmd.arg(arg);
        self
    }

    /// Add multiple arguments to the command.
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    /// Execute the command and assert success.
    pub fn run_success(mut self) -> assert_cmd::assert::Assert {
        self.cmd.assert().success()
    }

    /// Execute the command and assert failure.
    pub fn run_failure(mut self) -> assert_cmd::assert::Assert {
        self.cmd.assert().failure()
    }

    /// Execute and return trimmed stdout, asserting success.
    pub fn stdout(mut self) -> String {
        let output = self.cmd.assert().success().get_output().stdout.clone();
        String::from_utf8(output)
            .expect("stdout is not UTF-8")
            .trim_end()
            .to_string()
    }

    /// Get the underlying Command for custom assertions.
    pub fn into_inner(self) -> Command {
        self.cmd
    }

    /// Initialize a repository in the given directory (quiet mode).
    pub fn init_quiet(dir: &Path) {
        gitkit()
            .arg("init")
            .arg("-q")
            .current_dir(dir)
            .assert()
            .success();
    }

    /// Store a file's content as a blob; returns the id.
    pub fn hash_object(dir: &Path, file: &str) -> String {
        Self::new().in_dir(dir).args(&["hash-object", "-w", file]).stdout()
    }

    /// Resolve a revision; returns the id.
    pub fn rev_parse(dir: &Path, rev: &str) -> String {
        Self::new().in_dir(dir).args(&["rev-parse", rev]).stdout()
    }
}

impl Default for GitkitCommand {
    fn default() -> Self {
        Self::new()
    }
}
