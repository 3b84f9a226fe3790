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

//! Object types and the typed object model

use crate::commit::Commit;
use crate::error::{GitError, GitResult};
use crate::oid::Oid;
use crate::raw::RawObject;
use crate::tag::Tag;
use crate::tree::Tree;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The four kinds of object Git stores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectType {
    /// Snapshot metadata with parent links
    Commit,
    /// Directory listing
    Tree,
    /// File content
    Blob,
    /// Annotated tag
    Tag,
}

impl ObjectType {
    /// All variants, in numeric-code order
    pub const ALL: [ObjectType; 4] = [
        ObjectType::Commit,
        ObjectType::Tree,
        ObjectType::Blob,
        ObjectType::Tag,
    ];

    /// Name used in loose object headers
    ///
    /// ```
    /// use gitkit_versioning::ObjectType;
    ///
    /// assert_eq!(ObjectType::Commit.as_str(), "commit");
    /// assert_eq!(ObjectType::Tag.as_str(), "tag");
    /// ```
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Commit => "commit",
            ObjectType::Tree => "tree",
            ObjectType::Blob => "blob",
            ObjectType::Tag => "tag",
        }
    }

    /// Parse a header type name
    pub fn parse(s: &str) -> GitResult<Self> {
        match s {
            "commit" => Ok(ObjectType::Commit),
            "tree" => Ok(ObjectType::Tree),
            "blob" => Ok(ObjectType::Blob),
            "tag" => Ok(ObjectType::Tag),
            _ => Err(GitError::invalid_format(format!(
                "unknown object type: {}",
                s
            ))),
        }
    }

    /// Git's numeric type code
    pub fn to_u8(self) -> u8 {
        match self {
            ObjectType::Commit => 1,
            ObjectType::Tree => 2,
            ObjectType::Blob => 3,
            ObjectType::Tag => 4,
        }
    }

    /// Type for a numeric code
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(ObjectType::Commit),
            2 => Some(ObjectType::Tree),
            3 => Some(ObjectType::Blob),
            4 => Some(ObjectType::Tag),
            _ => None,
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectType {
    type Err = GitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObjectType::parse(s)
    }
}

/// File content
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Blob {
    content: Vec<u8>,
}

impl Blob {
    /// Wrap content bytes
    pub fn new(content: impl Into<Vec<u8>>) -> Self {
        Blob {
            content: content.into(),
        }
    }

    /// Parse a blob payload; every byte sequence is valid
    pub fn parse(data: &[u8]) -> GitResult<Self> {
        Ok(Blob::new(data))
    }

    /// Content bytes
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Content length in bytes
    pub fn size(&self) -> usize {
        self.content.len()
    }

    /// Git's heuristic: a NUL in the first 8000 bytes means binary
    pub fn is_binary(&self) -> bool {
        self.content.iter().take(8000).any(|b| *b == 0)
    }

    /// Content as UTF-8, if it is
    pub fn as_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.content).ok()
    }

    /// Take the content bytes
    pub fn into_content(self) -> Vec<u8> {
        self.content
    }
}

/// Parsed payload of an object
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectBody {
    /// Commit
    Commit(Commit),
    /// Tree
    Tree(Tree),
    /// Blob
    Blob(Blob),
    /// Annotated tag
    Tag(Tag),
}

impl ObjectBody {
    /// Type of the payload
    pub fn kind(&self) -> ObjectType {
        match self {
            ObjectBody::Commit(_) => ObjectType::Commit,
            ObjectBody::Tree(_) => ObjectType::Tree,
            ObjectBody::Blob(_) => ObjectType::Blob,
            ObjectBody::Tag(_) => ObjectType::Tag,
        }
    }

    /// Canonical bytes Git would store for this payload
    pub fn serialize(&self) -> Vec<u8> {
        match self {
            ObjectBody::Commit(commit) => commit.serialize(),
            ObjectBody::Tree(tree) => tree.serialize(),
            ObjectBody::Blob(blob) => blob.content().to_vec(),
            ObjectBody::Tag(tag) => tag.serialize(),
        }
    }
}

/// Function turning a payload into a typed body
pub type BodyParser = fn(&[u8]) -> GitResult<ObjectBody>;

/// Parser for the payload of `kind`
pub fn parser_for(kind: ObjectType) -> BodyParser {
    match kind {
        ObjectType::Commit => parse_commit,
        ObjectType::Tree => parse_tree,
        ObjectType::Blob => parse_blob,
        ObjectType::Tag => parse_tag,
    }
}

fn parse_commit(data: &[u8]) -> GitResult<ObjectBody> {
    Commit::parse(data).map(ObjectBody::Commit)
}

fn parse_tree(data: &[u8]) -> GitResult<ObjectBody> {
    Tree::parse(data).map(ObjectBody::Tree)
}

fn parse_blob(data: &[u8]) -> GitResult<ObjectBody> {
    Blob::parse(data).map(ObjectBody::Blob)
}

fn parse_tag(data: &[u8]) -> GitResult<ObjectBody> {
    Tag::parse(data).map(ObjectBody::Tag)
}

/// A typed object together with its id
#[derive(Debug, Clone, PartialEq)]
pub struct GitObject {
    id: Oid,
    body: ObjectBody,
}

impl GitObject {
    /// Pair an id with a payload
    pub fn new(id: Oid, body: ObjectBody) -> Self {
        GitObject { id, body }
    }

    /// Parse a raw object into its typed form
    ///
    /// A payload that doesn't parse as its declared type is stored data
    /// gone bad, so it is reported as `Corrupt`.
    pub fn from_raw(raw: &RawObject) -> GitResult<Self> {
        let parse = parser_for(raw.kind());
        let body = parse(raw.data()).map_err(|e| match e {
            GitError::InvalidFormat(reason) => GitError::corrupt(raw.id(), reason),
            other => other,
        })?;
        Ok(GitObject { id: raw.id(), body })
    }

    /// Object id
    pub fn id(&self) -> Oid {
        self.id
    }

    /// Object type
    pub fn kind(&self) -> ObjectType {
        self.body.kind()
    }

    /// Parsed payload
    pub fn body(&self) -> &ObjectBody {
        &self.body
    }

    /// Take the payload
    pub fn into_body(self) -> ObjectBody {
        self.body
    }

    /// Commit payload, if this is a commit
    pub fn as_commit(&self) -> Option<&Commit> {
        match &self.body {
            ObjectBody::Commit(commit) => Some(commit),
            _ => None,
        }
    }

    /// Tree payload, if this is a tree
    pub fn as_tree(&self) -> Option<&Tree> {
        match &self.body {
            ObjectBody::Tree(tree) => Some(tree),
            _ => None,
        }
    }

    /// Blob payload, if this is a blob
    pub fn as_blob(&self) -> Option<&Blob> {
        match &self.body {
            ObjectBody::Blob(blob) => Some(blob),
            _ => None,
        }
    }

    /// Tag payload, if this is a tag
    pub fn as_tag(&self) -> Option<&Tag> {
        match &self.body {
            ObjectBody::Tag(tag) => Some(tag),
            _ => None,
        }
    }

    /// Take the commit payload
    pub fn into_commit(self) -> Option<Commit> {
        match self.body {
            ObjectBody::Commit(commit) => Some(commit),
            _ => None,
        }
    }

    /// Take the tree payload
    pub fn into_tree(self) -> Option<Tree> {
        match self.body {
            ObjectBody::Tree(tree) => Some(tree),
            _ => None,
        }
    }

    /// Take the blob payload
    pub fn into_blob(self) -> Option<Blob> {
        match self.body {
            ObjectBody::Blob(blob) => Some(blob),
            _ => None,
        }
    }

    /// Take the tag payload
    pub fn into_tag(self) -> Option<Tag> {
        match self.body {
            ObjectBody::Tag(tag) => Some(tag),
            _ => None,
        }
    }
}
