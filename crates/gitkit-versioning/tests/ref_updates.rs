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

//! Reference updates under contention and symbolic chain limits

use gitkit_config::{Config, RefsConfig};
use gitkit_test_utils::{assert_no_lock_files, assert_ref, TestRepo};
use gitkit_versioning::{GitError, Oid, RefDatabase, Repository};
use std::sync::{Arc, Barrier};
use std::thread;

const A: &str = "8496071c1b46c854b31185ea97743be6a8774479";

fn oid(hex: &str) -> Oid {
    Oid::from_hex(hex).unwrap()
}

#[test]
fn test_two_writers_one_winner() {
    for round in 0..20 {
        let test_repo = TestRepo::with_git_layout();
        test_repo.write_ref("refs/heads/master", A);
        let git_dir = test_repo.git_dir();

        let barrier = Arc::new(Barrier::new(2));
        let handles: Vec<_> = (0..2u8)
            .map(|i| {
                let barrier = Arc::clone(&barrier);
                let git_dir = git_dir.clone();
                thread::spawn(move || {
                    let refs = RefDatabase::new(&git_dir);
                    let new = Oid::hash(&[round, i]);
                    barrier.wait();
                    (new, refs.update("refs/heads/master", new, Some(oid(A))))
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let winners: Vec<_> = results.iter().filter(|(_, r)| r.is_ok()).collect();
        assert_eq!(winners.len(), 1, "round {}: {:?}", round, results);
        for (_, result) in &results {
            if let Err(e) = result {
                assert!(matches!(e, GitError::ConcurrentRefUpdate { .. }), "{:?}", e);
            }
        }
        assert_ref(&git_dir, "refs/heads/master", &winners[0].0.to_hex());
        assert_no_lock_files(&git_dir);
    }
}

#[test]
fn test_repository_update_reference_cas() {
    let test_repo = TestRepo::with_git_layout();
    let repo = Repository::open(test_repo.path()).unwrap();
    let b = Oid::hash(b"b");

    repo.update_reference("refs/heads/master", oid(A), Some(Oid::zero()))
        .unwrap();
    assert!(matches!(
        repo.update_reference("refs/heads/master", b, Some(Oid::zero())),
        Err(GitError::ConcurrentRefUpdate { .. })
    ));
    repo.update_reference("refs/heads/master", b, Some(oid(A))).unwrap();
    assert_eq!(repo.head_id().unwrap(), Some(b));
}

#[test]
fn test_symbolic_cycle_fails() {
    let test_repo = TestRepo::with_git_layout();
    test_repo.write_ref("refs/heads/a", "ref: refs/heads/b");
    test_repo.write_ref("refs/heads/b", "ref: refs/heads/a");
    test_repo.write_ref("HEAD", "ref: refs/heads/a");
    let repo = Repository::open(test_repo.path()).unwrap();

    assert!(matches!(
        repo.head_id(),
        Err(GitError::InvalidReferenceState { .. })
    ));
    assert!(matches!(
        repo.rev_parse("HEAD"),
        Err(GitError::InvalidReferenceState { .. })
    ));
}

#[test]
fn test_symbolic_depth_is_configurable() {
    let test_repo = TestRepo::with_git_layout();
    // HEAD -> l1 -> l2 -> l3 -> master
    test_repo.write_ref("HEAD", "ref: refs/heads/l1");
    test_repo.write_ref("refs/heads/l1", "ref: refs/heads/l2");
    test_repo.write_ref("refs/heads/l2", "ref: refs/heads/l3");
    test_repo.write_ref("refs/heads/l3", "ref: refs/heads/master");
    test_repo.write_ref("refs/heads/master", A);

    let repo = Repository::open(test_repo.path()).unwrap();
    assert_eq!(repo.head_id().unwrap(), Some(oid(A)));
    repo.close();

    let strict = Config {
        refs: RefsConfig {
            max_symbolic_depth: 3,
            ..RefsConfig::default()
        },
        ..Config::default()
    };
    let repo = Repository::open_with_config(test_repo.path(), strict).unwrap();
    assert!(matches!(
        repo.head_id(),
        Err(GitError::InvalidReferenceState { .. })
    ));
}

#[test]
fn test_stale_lock_surfaces_after_retries() {
    let test_repo = TestRepo::with_git_layout();
    test_repo.write_ref("refs/heads/master", A);
    test_repo.write_ref("refs/heads/master.lock", "held");

    let config = Config {
        refs: RefsConfig {
            lock_retries: 2,
            lock_backoff_ms: 1,
            ..RefsConfig::default()
        },
        ..Config::default()
    };
    let repo = Repository::open_with_config(test_repo.path(), config).unwrap();
    assert!(matches!(
        repo.update_reference("refs/heads/master", Oid::hash(b"x"), None),
        Err(GitError::ConcurrentRefUpdate { .. })
    ));
    // The other writer's lock is left alone.
    assert!(test_repo.git_dir().join("refs/heads/master.lock").exists());
    assert_ref(&test_repo.git_dir(), "refs/heads/master", A);
}
