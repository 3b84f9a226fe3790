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

//! Integration tests for reference plumbing

mod common;

use common::commit_files;
use gitkit_test_utils::{assert_no_lock_files, assert_ref, gitkit, GitkitCommand, TestRepo};
use predicates::prelude::*;

const ZERO: &str = "0000000000000000000000000000000000000000";

#[test]
fn test_update_ref_and_show_ref() {
    let repo = TestRepo::initialized();
    let first = commit_files(repo.path(), &[("a.txt", "one\n")], "first");

    gitkit()
        .args(["update-ref", "refs/heads/topic", &first])
        .current_dir(repo.path())
        .assert()
        .success();
    assert_ref(&repo.git_dir(), "refs/heads/topic", &first);

    gitkit()
        .arg("show-ref")
        .current_dir(repo.path())
        .assert()
        .success()
        .stdout(format!(
            "{0} refs/heads/master\n{0} refs/heads/topic\n",
            first
        ));

    gitkit()
        .args(["show-ref", "--head", "topic"])
        .current_dir(repo.path())
        .assert()
        .success()
        .stdout(format!("{0} HEAD\n{0} refs/heads/topic\n", first));
    assert_no_lock_files(&repo.git_dir());
}

#[test]
fn test_update_ref_compare_and_swap() {
    let repo = TestRepo::initialized();
    let first = commit_files(repo.path(), &[("a.txt", "one\n")], "first");
    let second = commit_files(repo.path(), &[("a.txt", "two\n")], "second");

    // A stale old value loses.
    gitkit()
        .args(["update-ref", "refs/heads/master", &first, &first])
        .current_dir(repo.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("concurrent update"));
    assert_ref(&repo.git_dir(), "refs/heads/master", &second);

    // Zeros: the ref must not exist yet.
    gitkit()
        .args(["update-ref", "refs/heads/master", &first, ZERO])
        .current_dir(repo.path())
        .assert()
        .failure();
    gitkit()
        .args(["update-ref", "refs/heads/fresh", &first, ZERO])
        .current_dir(repo.path())
        .assert()
        .success();

    gitkit()
        .args(["update-ref", "refs/heads/master", &first, &second])
        .current_dir(repo.path())
        .assert()
        .success();
    assert_ref(&repo.git_dir(), "refs/heads/master", &first);
}

#[test]
fn test_update_ref_delete() {
    let repo = TestRepo::initialized();
    let first = commit_files(repo.path(), &[("a.txt", "one\n")], "first");
    gitkit()
        .args(["update-ref", "refs/heads/gone", &first])
        .current_dir(repo.path())
        .assert()
        .success();

    gitkit()
        .args(["update-ref", "-d", "refs/heads/gone", ZERO])
        .current_dir(repo.path())
        .assert()
        .failure();
    gitkit()
        .args(["update-ref", "-d", "refs/heads/gone", &first])
        .current_dir(repo.path())
        .assert()
        .success();
    assert!(!repo.git_dir().join("refs/heads/gone").exists());
}

#[test]
fn test_update_ref_rejects_bad_names() {
    let repo = TestRepo::initialized();
    let first = commit_files(repo.path(), &[("a.txt", "one\n")], "first");
    for name in ["refs/heads/a..b", "refs/heads/x.lock", "lowercase"] {
        gitkit()
            .args(["update-ref", name, &first])
            .current_dir(repo.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("invalid format"));
    }
}

#[test]
fn test_symbolic_ref() {
    let repo = TestRepo::initialized();
    let first = commit_files(repo.path(), &[("a.txt", "one\n")], "first");
    gitkit()
        .args(["update-ref", "refs/heads/topic", &first])
        .current_dir(repo.path())
        .assert()
        .success();

    gitkit()
        .args(["symbolic-ref", "HEAD", "refs/heads/topic"])
        .current_dir(repo.path())
        .assert()
        .success();
    assert_ref(&repo.git_dir(), "HEAD", "ref: refs/heads/topic");
    assert_eq!(
        GitkitCommand::new()
            .in_dir(repo.path())
            .args(&["symbolic-ref", "--short", "HEAD"])
            .stdout(),
        "topic"
    );

    gitkit()
        .args(["symbolic-ref", "refs/heads/topic"])
        .current_dir(repo.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a symbolic ref"));
    gitkit()
        .args(["symbolic-ref", "HEAD", "elsewhere"])
        .current_dir(repo.path())
        .assert()
        .failure();
}

#[test]
fn test_symbolic_cycle_is_reported() {
    let repo = TestRepo::initialized();
    repo.write_ref("refs/heads/ping", "ref: refs/heads/pong");
    repo.write_ref("refs/heads/pong", "ref: refs/heads/ping");

    gitkit()
        .args(["rev-parse", "refs/heads/ping"])
        .current_dir(repo.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid reference state"));
}

#[test]
fn test_packed_refs_are_listed() {
    let repo = TestRepo::initialized();
    let first = commit_files(repo.path(), &[("a.txt", "one\n")], "first");
    repo.write_packed_refs(&[(&first, "refs/heads/packed"), (&first, "refs/tags/old")]);

    gitkit()
        .args(["show-ref", "--tags"])
        .current_dir(repo.path())
        .assert()
        .success()
        .stdout(format!("{} refs/tags/old\n", first));
    assert_eq!(GitkitCommand::rev_parse(repo.path(), "packed"), first);
}

#[test]
fn test_show_ref_without_matches_exits_one() {
    let repo = TestRepo::initialized();
    gitkit()
        .arg("show-ref")
        .current_dir(repo.path())
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty());
}
