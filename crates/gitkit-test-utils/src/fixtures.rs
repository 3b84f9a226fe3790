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

//! Known Git objects.
//!
//! Every id below is what `git hash-object` prints for the content.

use flate2::write::ZlibEncoder;
use flate2::Compression;
use sha1::{Digest, Sha1};
use std::io::Write;

/// A stored object with its expected id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fixture {
    /// Loose type name: `blob`, `tree`, `commit` or `tag`
    pub kind: &'static str,
    /// Expected id, lowercase hex
    pub id: &'static str,
    /// Payload without the loose header
    pub content: &'static [u8],
}

impl Fixture {
    /// `"<type> <len>\0" + content`
    pub fn loose_bytes(&self) -> Vec<u8> {
        loose_bytes(self.kind, self.content)
    }

    /// Zlib-deflated loose encoding, as stored under `objects/`
    pub fn deflated(&self) -> Vec<u8> {
        deflate(&self.loose_bytes())
    }
}

/// `"<type> <len>\0" + content`
pub fn loose_bytes(kind: &str, content: &[u8]) -> Vec<u8> {
    let mut out = format!("{} {}\0", kind, content.len()).into_bytes();
    out.extend_from_slice(content);
    out
}

/// SHA-1 of the loose encoding, lowercase hex
pub fn object_id(kind: &str, content: &[u8]) -> String {
    hex::encode(Sha1::digest(loose_bytes(kind, content)))
}

/// Zlib-deflate at the default level
pub fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .expect("Failed to deflate fixture");
    encoder.finish().expect("Failed to finish deflate stream")
}

/// Test fixture collection.
pub struct TestFixtures;

impl TestFixtures {
    /// `hey there\n`
    pub const BLOB: Fixture = Fixture {
        kind: "blob",
        id: "a8233120f6ad708f843d861ce2b7228ec4e3dec6",
        content: b"hey there\n",
    };

    /// The empty blob
    pub const EMPTY_BLOB: Fixture = Fixture {
        kind: "blob",
        id: "e69de29bb2d1d6434b8b29ae775ad8c2e48c5391",
        content: b"",
    };

    /// A tree holding `README` -> [`TestFixtures::BLOB`]
    pub const README_TREE: Fixture = Fixture {
        kind: "tree",
        id: "1b8cbad43e867676df601306689fe7c3def5e689",
        content: b"100644 README\0\xa8\x23\x31\x20\xf6\xad\x70\x8f\x84\x3d\x86\x1c\xe2\xb7\x22\x8e\xc4\xe3\xde\xc6",
    };

    /// The empty tree
    pub const EMPTY_TREE: Fixture = Fixture {
        kind: "tree",
        id: "4b825dc642cb6eb9a060e54bf8d69288fbee4904",
        content: b"",
    };

    /// A 172-byte root commit with the message `testing`
    pub const TESTING_COMMIT: Fixture = Fixture {
        kind: "commit",
        id: "8496071c1b46c854b31185ea97743be6a8774479",
        content: b"tree 181037049a54a1eb5fab404658a3a250b44335d7\n\
author Scott Chacon <schacon@gmail.com> 1273360386 -0700\n\
committer Scott Chacon <schacon@gmail.com> 1273360386 -0700\n\
\n\
testing\n",
    };

    /// Annotated tag `e90810b` by Vicent Marti
    pub const SIMPLE_TAG: Fixture = Fixture {
        kind: "tag",
        id: "7b4384978d2493e851f9cca7858815fac9b10980",
        content: b"object e90810b8df3e80c413d903f631643c716887138d\n\
type commit\n\
tag e90810b\n\
tagger Vicent Marti <tanoku@gmail.com> 1281578357 +0200\n\
\n\
This is a very simple tag.\n",
    };

    /// Annotated tag `v1.0` by Scott Chacon on commit `5b5b025`
    pub const V1_TAG: Fixture = Fixture {
        kind: "tag",
        id: "217ebd4f305cab547aed282e9d6f4be52bd0396c",
        content: b"object 5b5b025afb0b4c913b4c338a42934a3863bf3644\n\
type commit\n\
tag v1.0\n\
tagger Scott Chacon <schacon@gmail.com> 1288114383 -0700\n\
\n\
This is a test tag\n",
    };

    /// Every fixture above
    pub fn all() -> [Fixture; 7] {
        [
            Self::BLOB,
            Self::EMPTY_BLOB,
            Self::README_TREE,
            Self::EMPTY_TREE,
            Self::TESTING_COMMIT,
            Self::SIMPLE_TAG,
            Self::V1_TAG,
        ]
    }

    /// Sample text content.
    pub fn text_file(content: &str) -> Vec<u8> {
        content.as_bytes().to_vec()
    }

    /// Deterministic binary content of `size` bytes, NULs included.
    pub fn binary_file(size: usize) -> Vec<u8> {
        (0..size).map(|i| (i % 256) as u8).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_ids_match_content() {
        for fixture in TestFixtures::all() {
            assert_eq!(
                object_id(fixture.kind, fixture.content),
                fixture.id,
                "{} {}",
                fixture.kind,
                fixture.id
            );
        }
        assert_eq!(TestFixtures::TESTING_COMMIT.content.len(), 172);
    }
}
