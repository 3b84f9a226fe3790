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

//! Commit objects
//!
//! A commit names a tree snapshot, zero or more parents, who wrote it and
//! who committed it. Headers Gitkit doesn't interpret (`gpgsig`,
//! `mergetag`, ...) are kept in order so a parsed commit serializes back to
//! the same bytes.

use crate::error::{GitError, GitResult};
use crate::headers;
use crate::oid::Oid;
use crate::signature::Signature;

/// Commit object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    /// Root tree of the snapshot
    pub tree: Oid,
    /// Parent commits, first parent first
    pub parents: Vec<Oid>,
    /// Who wrote the change
    pub author: Signature,
    /// Who recorded it
    pub committer: Signature,
    /// Value of the `encoding` header, if any
    pub encoding: Option<String>,
    /// Uninterpreted headers in their original order
    pub extra_headers: Vec<(String, String)>,
    /// Message, exactly as stored
    pub message: String,
}

impl Commit {
    /// Create a commit with no extra headers
    pub fn new(
        tree: Oid,
        parents: Vec<Oid>,
        author: Signature,
        committer: Signature,
        message: impl Into<String>,
    ) -> Self {
        Commit {
            tree,
            parents,
            author,
            committer,
            encoding: None,
            extra_headers: Vec::new(),
            message: message.into(),
        }
    }

    /// Parse a commit payload
    pub fn parse(data: &[u8]) -> GitResult<Self> {
        let block = headers::parse(data, "commit")?;

        let mut tree = None;
        let mut parents = Vec::new();
        let mut author = None;
        let mut committer = None;
        let mut encoding = None;
        let mut extra_headers = Vec::new();

        for (key, value) in block.fields {
            match key.as_str() {
                "tree" if tree.is_none() => tree = Some(Oid::from_hex(&value)?),
                "parent" => parents.push(Oid::from_hex(&value)?),
                "author" if author.is_none() => author = Some(Signature::parse(&value)?),
                "committer" if committer.is_none() => {
                    committer = Some(Signature::parse(&value)?)
                }
                "encoding" if encoding.is_none() => encoding = Some(value),
                _ => extra_headers.push((key, value)),
            }
        }

        let missing = |field: &str| GitError::invalid_format(format!("commit has no {}", field));
        Ok(Commit {
            tree: tree.ok_or_else(|| missing("tree"))?,
            parents,
            author: author.ok_or_else(|| missing("author"))?,
            committer: committer.ok_or_else(|| missing("committer"))?,
            encoding,
            extra_headers,
            message: block.message,
        })
    }

    /// Canonical bytes, as Git writes them
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(256 + self.message.len());
        headers::write_field(&mut out, "tree", &self.tree.to_hex());
        for parent in &self.parents {
            headers::write_field(&mut out, "parent", &parent.to_hex());
        }
        headers::write_field(&mut out, "author", &self.author.to_git_string());
        headers::write_field(&mut out, "committer", &self.committer.to_git_string());
        if let Some(encoding) = &self.encoding {
            headers::write_field(&mut out, "encoding", encoding);
        }
        for (key, value) in &self.extra_headers {
            headers::write_field(&mut out, key, value);
        }
        out.push(b'\n');
        out.extend_from_slice(self.message.as_bytes());
        out
    }

    /// True for a root commit
    pub fn is_initial(&self) -> bool {
        self.parents.is_empty()
    }

    /// True when there is more than one parent
    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }

    /// First parent, if any
    pub fn first_parent(&self) -> Option<Oid> {
        self.parents.first().copied()
    }

    /// First line of the message
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("").trim_end()
    }
}
