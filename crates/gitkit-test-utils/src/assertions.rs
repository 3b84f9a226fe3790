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

//! Custom test assertions for on-disk repository state.

use crate::fixtures::object_id;
use flate2::read::ZlibDecoder;
use std::fs;
use std::io::Read;
use std::path::Path;

/// Assert that `git_dir` has the directories and files Git requires.
pub fn assert_git_layout(git_dir: &Path) {
    assert!(git_dir.join("HEAD").is_file(), "HEAD should exist in {:?}", git_dir);
    for dir in ["objects", "objects/info", "objects/pack", "refs/heads", "refs/tags"] {
        assert!(
            git_dir.join(dir).is_dir(),
            "{} directory should exist in {:?}",
            dir,
            git_dir
        );
    }
    assert!(git_dir.join("config").is_file(), "config should exist");
}

/// Assert that a loose object is stored, inflates, and hashes to its id.
///
/// Returns the type name and payload.
pub fn assert_loose_object(git_dir: &Path, id: &str) -> (String, Vec<u8>) {
    let (dir, file) = id.split_at(2);
    let path = git_dir.join("objects").join(dir).join(file);
    let compressed = fs::read(&path).unwrap_or_else(|e| panic!("object {} missing: {}", id, e));

    let mut raw = Vec::new();
    ZlibDecoder::new(compressed.as_slice())
        .read_to_end(&mut raw)
        .unwrap_or_else(|e| panic!("object {} does not inflate: {}", id, e));

    let nul = raw.iter().position(|b| *b == 0).expect("loose header has no NUL");
    let header = std::str::from_utf8(&raw[..nul]).expect("loose header is not UTF-8");
    let (kind, len) = header.split_once(' ').expect("loose header has no space");
    let content = raw[nul + 1..].to_vec();
    assert_eq!(len.parse::<usize>().ok(), Some(content.len()), "declared length of {}", id);
    assert_eq!(object_id(kind, &content), id, "stored bytes hash to a different id");
    (kind.to_string(), content)
}

/// Assert that a loose ref holds exactly `value` (hex id or `ref: …`).
pub fn assert_ref(git_dir: &Path, name: &str, value: &str) {
    let content = fs::read_to_string(git_dir.join(name))
        .unwrap_or_else(|e| panic!("ref {} missing: {}", name, e));
    assert_eq!(content, format!("{}\n", value), "content of {}", name);
}

/// Assert that no `*.lock` file is left anywhere under `dir`.
pub fn assert_no_lock_files(dir: &Path) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            assert_no_lock_files(&path);
        } else {
            assert!(
                path.extension().map_or(true, |ext| ext != "lock"),
                "stale lock file {:?}",
                path
            );
        }
    }
}
