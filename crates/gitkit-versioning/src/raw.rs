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

//! Raw objects and the loose-object header `"<type> <len>\0"`

use crate::error::{GitError, GitResult};
use crate::object::ObjectType;
use crate::oid::Oid;

/// Upper bound on a loose header, NUL included
pub const MAX_HEADER_LEN: usize = 64;

/// Id, type and content length of a stored object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Header {
    /// Object id
    pub id: Oid,
    /// Object type
    pub kind: ObjectType,
    /// Content length in bytes, header excluded
    pub length: u64,
}

impl Header {
    /// Build a header
    pub fn new(id: Oid, kind: ObjectType, length: u64) -> Self {
        Header { id, kind, length }
    }
}

/// An object's header plus its uncompressed content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawObject {
    header: Header,
    data: Vec<u8>,
}

impl RawObject {
    /// Pair a header with content
    pub fn new(header: Header, data: Vec<u8>) -> Self {
        RawObject { header, data }
    }

    /// Hash `data` as an object of `kind`
    pub fn from_content(kind: ObjectType, data: Vec<u8>) -> Self {
        let id = Oid::hash_object(kind, &data);
        let header = Header::new(id, kind, data.len() as u64);
        RawObject { header, data }
    }

    /// Header
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Object id
    pub fn id(&self) -> Oid {
        self.header.id
    }

    /// Object type
    pub fn kind(&self) -> ObjectType {
        self.header.kind
    }

    /// Content length
    pub fn len(&self) -> u64 {
        self.header.length
    }

    /// True for empty content
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Content bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Take the content bytes
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Uncompressed loose encoding, header included
    pub fn encode(&self) -> Vec<u8> {
        encode_loose(self.kind(), &self.data)
    }
}

/// `"<type> <len>\0"` followed by `data`
pub fn encode_loose(kind: ObjectType, data: &[u8]) -> Vec<u8> {
    let header = format!("{} {}\0", kind.as_str(), data.len());
    let mut out = Vec::with_capacity(header.len() + data.len());
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(data);
    out
}

/// Parse a loose header at the start of `buf`
///
/// Returns the type, the declared content length and the number of header
/// bytes (NUL included). The length must be plain decimal with no sign and
/// no leading zeros.
pub fn parse_loose_header(buf: &[u8]) -> GitResult<(ObjectType, u64, usize)> {
    let window = &buf[..buf.len().min(MAX_HEADER_LEN)];
    let nul = window
        .iter()
        .position(|b| *b == 0)
        .ok_or_else(|| GitError::invalid_format("object header is not NUL-terminated"))?;
    let header = std::str::from_utf8(&window[..nul])
        .map_err(|_| GitError::invalid_format("object header is not ASCII"))?;

    let (kind, length) = header
        .split_once(' ')
        .ok_or_else(|| GitError::invalid_format(format!("malformed object header: {:?}", header)))?;
    let kind = ObjectType::parse(kind)?;

    let valid_digits = !length.is_empty()
        && length.bytes().all(|b| b.is_ascii_digit())
        && (length == "0" || !length.starts_with('0'));
    if !valid_digits {
        return Err(GitError::invalid_format(format!(
            "malformed object length: {:?}",
            length
        )));
    }
    let length: u64 = length
        .parse()
        .map_err(|_| GitError::invalid_format(format!("object length out of range: {}", length)))?;

    Ok((kind, length, nul + 1))
}
