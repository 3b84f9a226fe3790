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

//! Shared helpers for CLI tests

#![allow(dead_code)]

use gitkit_test_utils::{gitkit, GitkitCommand};
use std::path::Path;

pub const USER_NAME: &str = "A U Thor";
pub const USER_EMAIL: &str = "author@example.com";

/// `gitkit` with an identity configured through the environment
pub fn gitkit_as_author() -> assert_cmd::Command {
    let mut cmd = gitkit();
    cmd.env("GITKIT_USER_NAME", USER_NAME)
        .env("GITKIT_USER_EMAIL", USER_EMAIL);
    cmd
}

fn stdout_of(cmd: &mut assert_cmd::Command) -> String {
    let output = cmd.assert().success().get_output().stdout.clone();
    String::from_utf8(output).unwrap().trim_end().to_string()
}

/// Stage `files`, write the tree and commit it on top of HEAD
pub fn commit_files(dir: &Path, files: &[(&str, &str)], message: &str) -> String {
    for (name, content) in files {
        let path = dir.join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        gitkit().current_dir(dir).args(["add", name]).assert().success();
    }
    let tree = GitkitCommand::new().in_dir(dir).arg("write-tree").stdout();

    let mut cmd = gitkit_as_author();
    cmd.current_dir(dir).args(["commit-tree", &tree, "-m", message]);
    let parent = head_id(dir);
    if let Some(parent) = &parent {
        cmd.args(["-p", parent]);
    }
    let commit = stdout_of(&mut cmd);

    let old = parent.unwrap_or_default();
    gitkit()
        .current_dir(dir)
        .args(["update-ref", "HEAD", commit.as_str(), old.as_str()])
        .assert()
        .success();
    commit
}

/// Id HEAD resolves to, `None` while the branch is unborn
pub fn head_id(dir: &Path) -> Option<String> {
    let output = gitkit()
        .current_dir(dir)
        .args(["rev-parse", "HEAD"])
        .output()
        .unwrap();
    if output.status.success() {
        Some(String::from_utf8(output.stdout).unwrap().trim().to_string())
    } else {
        None
    }
}
