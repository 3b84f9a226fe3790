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

//! Reading objects that Git wrote
//!
//! Repositories are laid out by `gitkit-test-utils` with an encoder that
//! shares no code with the object database.

use gitkit_test_utils::{assert_loose_object, TestFixtures, TestRepo};
use gitkit_versioning::{GitError, ObjectType, Oid, Repository, Signature};

fn fixture_repo() -> (TestRepo, Repository) {
    let test_repo = TestRepo::with_git_layout();
    for fixture in TestFixtures::all() {
        test_repo.install_fixture(&fixture);
    }
    let repo = Repository::open(test_repo.path()).unwrap();
    (test_repo, repo)
}

fn oid(hex: &str) -> Oid {
    Oid::from_hex(hex).unwrap()
}

#[test]
fn test_known_commit_header_and_content() {
    let (_test_repo, repo) = fixture_repo();
    let id = oid(TestFixtures::TESTING_COMMIT.id);

    assert!(repo.exists(&id).unwrap());
    let header = repo.read_header(&id).unwrap();
    assert_eq!(header.kind, ObjectType::Commit);
    assert_eq!(header.length, 172);
    assert_eq!(header.id, id);

    let raw = repo.read(&id).unwrap();
    assert_eq!(raw.header().id, id);
    assert!(raw.data().starts_with(b"tree "));
    assert!(raw.data().ends_with(b"testing\n"));
    assert_eq!(Oid::hash_object(raw.kind(), raw.data()), id);

    let commit = repo.lookup_commit(&id).unwrap().unwrap();
    assert_eq!(commit.author.name(), "Scott Chacon");
    assert_eq!(commit.author.offset_minutes(), -420);
    assert!(commit.is_initial());
}

#[test]
fn test_v1_tag_lookup() {
    let (test_repo, repo) = fixture_repo();
    test_repo.write_ref("refs/tags/v1.0", TestFixtures::V1_TAG.id);

    let object = repo.resolve("v1.0").unwrap().expect("v1.0 resolves");
    assert_eq!(object.kind(), ObjectType::Tag);
    let tag = object.as_tag().unwrap();
    assert_eq!(tag.name, "v1.0");
    assert_eq!(tag.target, oid("5b5b025afb0b4c913b4c338a42934a3863bf3644"));
    assert_eq!(tag.target_type, ObjectType::Commit);
    assert_eq!(tag.tagger.as_ref().unwrap().email(), "schacon@gmail.com");
    assert_eq!(tag.message, "This is a test tag\n");
}

#[test]
fn test_lookup_with_wrong_type_is_none() {
    let (_test_repo, repo) = fixture_repo();
    let tree = oid(TestFixtures::README_TREE.id);
    assert!(repo.lookup(&tree, Some(ObjectType::Tree)).unwrap().is_some());
    assert!(repo.lookup(&tree, Some(ObjectType::Blob)).unwrap().is_none());

    let readme = repo.lookup_tree(&tree).unwrap().unwrap();
    let entry = readme.get("README").unwrap();
    assert_eq!(entry.id, oid(TestFixtures::BLOB.id));
    assert_eq!(
        repo.lookup_blob(&entry.id).unwrap().unwrap().as_text(),
        Some("hey there\n")
    );
}

#[test]
fn test_abbreviated_ids() {
    let (test_repo, repo) = fixture_repo();
    assert_eq!(
        repo.rev_parse("8496071").unwrap(),
        oid(TestFixtures::TESTING_COMMIT.id)
    );

    // Two objects sharing a prefix.
    let a = test_repo.install_loose_object("blob", b"first");
    let mut other = 0u32;
    let b = loop {
        let content = format!("second {}", other);
        let id = gitkit_test_utils::fixtures::object_id("blob", content.as_bytes());
        if id[..4] == a[..4] {
            break test_repo.install_loose_object("blob", content.as_bytes());
        }
        other += 1;
    };
    assert_ne!(a, b);
    assert!(matches!(
        repo.rev_parse(&a[..4]),
        Err(GitError::Ambiguous { count: 2, .. })
    ));
}

#[test]
fn test_corrupt_objects_are_not_missing() {
    let test_repo = TestRepo::with_git_layout();
    let id = TestFixtures::BLOB.id;

    // Right id, wrong content.
    test_repo.install_raw_object(id, &gitkit_test_utils::fixtures::deflate(b"blob 10\0hey there!"));
    let repo = Repository::open(test_repo.path()).unwrap();
    let err = repo.read_header(&oid(id)).unwrap_err();
    assert!(err.is_corrupt(), "{:?}", err);
    assert!(repo.read(&oid(id)).unwrap_err().is_corrupt());
    assert!(repo.lookup(&oid(id), None).unwrap_err().is_corrupt());

    // Not zlib at all.
    let garbage = TestFixtures::EMPTY_BLOB.id;
    test_repo.install_raw_object(garbage, b"definitely not deflate");
    assert!(repo.read(&oid(garbage)).unwrap_err().is_corrupt());

    assert!(matches!(
        repo.read_header(&Oid::hash(b"nothing here")),
        Err(GitError::ObjectNotFound(_))
    ));
}

#[test]
fn test_trailing_bytes_after_zlib_stream_are_corrupt() {
    let test_repo = TestRepo::with_git_layout();
    let mut stored = TestFixtures::BLOB.deflated();
    stored.extend_from_slice(b"garbage");
    test_repo.install_raw_object(TestFixtures::BLOB.id, &stored);

    let repo = Repository::open(test_repo.path()).unwrap();
    let id = oid(TestFixtures::BLOB.id);
    assert!(repo.read(&id).unwrap_err().is_corrupt());
    assert!(repo.read_header(&id).unwrap_err().is_corrupt());
}

#[test]
fn test_non_ascii_revision_suffix_is_an_error() {
    let (test_repo, repo) = fixture_repo();
    test_repo.write_ref("refs/heads/master", TestFixtures::TESTING_COMMIT.id);

    for spec in ["HEAD~é", "master^é", "master~1ü"] {
        assert!(
            matches!(repo.rev_parse(spec), Err(GitError::InvalidFormat(_))),
            "{}",
            spec
        );
        assert!(matches!(repo.resolve(spec), Err(GitError::InvalidFormat(_))));
    }
}

#[test]
fn test_written_objects_match_git() {
    let test_repo = TestRepo::with_git_layout();
    let repo = Repository::open(test_repo.path()).unwrap();

    let id = repo.write_blob(b"hey there\n").unwrap();
    assert_eq!(id.to_hex(), TestFixtures::BLOB.id);
    let (kind, content) = assert_loose_object(&test_repo.git_dir(), TestFixtures::BLOB.id);
    assert_eq!(kind, "blob");
    assert_eq!(content, b"hey there\n");

    let sig = Signature::from_epoch("Scott Chacon", "schacon@gmail.com", 1273360386, -420).unwrap();
    let tree = oid("181037049a54a1eb5fab404658a3a250b44335d7");
    let commit = gitkit_versioning::Commit::new(tree, vec![], sig.clone(), sig, "testing\n");
    let written = repo
        .write(ObjectType::Commit, &commit.serialize())
        .unwrap();
    assert_eq!(written.to_hex(), TestFixtures::TESTING_COMMIT.id);
    assert_loose_object(&test_repo.git_dir(), TestFixtures::TESTING_COMMIT.id);
}

#[test]
fn test_packed_refs_are_listed() {
    let (test_repo, repo) = fixture_repo();
    test_repo.write_packed_refs(&[
        (TestFixtures::TESTING_COMMIT.id, "refs/heads/master"),
        (TestFixtures::SIMPLE_TAG.id, "refs/tags/e90810b"),
    ]);
    test_repo.write_ref("refs/heads/topic", TestFixtures::TESTING_COMMIT.id);

    let names: Vec<String> = repo
        .references()
        .unwrap()
        .iter()
        .map(|r| r.name().to_string())
        .collect();
    assert_eq!(names, ["refs/heads/master", "refs/heads/topic", "refs/tags/e90810b"]);
    assert_eq!(
        repo.head_id().unwrap(),
        Some(oid(TestFixtures::TESTING_COMMIT.id))
    );
}
