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

//! Object identifier: the SHA-1 of an object's loose encoding
//!
//! An `Oid` is 20 raw bytes. Its text form is exactly 40 lowercase hex
//! characters. Ids compare byte-wise, which is also the order of their hex
//! strings.

use crate::error::{GitError, GitResult};
use crate::object::ObjectType;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha1::{Digest, Sha1};
use std::fmt;
use std::io;
use std::str::FromStr;

/// Object identifier, a SHA-1 digest
///
/// # Examples
///
/// ```
/// use gitkit_versioning::{ObjectType, Oid};
///
/// let oid = Oid::hash_object(ObjectType::Blob, b"hey there\n");
/// assert_eq!(oid.to_hex(), "a8233120f6ad708f843d861ce2b7228ec4e3dec6");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Oid([u8; Oid::RAW_SIZE]);

impl Oid {
    /// Size of the raw digest in bytes
    pub const RAW_SIZE: usize = 20;

    /// Length of the hex form
    pub const HEX_SIZE: usize = 40;

    /// Shortest prefix accepted for abbreviated lookups
    pub const MIN_PREFIX_LEN: usize = 4;

    /// SHA-1 of arbitrary bytes
    pub fn hash(data: &[u8]) -> Self {
        let digest = Sha1::digest(data);
        let mut bytes = [0u8; Self::RAW_SIZE];
        bytes.copy_from_slice(&digest);
        Oid(bytes)
    }

    /// Id Git assigns to `data` stored as an object of type `kind`
    pub fn hash_object(kind: ObjectType, data: &[u8]) -> Self {
        let mut hasher = ObjectHasher::new(kind, data.len() as u64);
        hasher.update(data);
        hasher.finish()
    }

    /// Wrap raw digest bytes
    pub const fn from_bytes(bytes: [u8; Self::RAW_SIZE]) -> Self {
        Oid(bytes)
    }

    /// Build an id from a slice that must be exactly 20 bytes long
    pub fn from_slice(bytes: &[u8]) -> GitResult<Self> {
        let raw: [u8; Self::RAW_SIZE] = bytes.try_into().map_err(|_| {
            GitError::invalid_format(format!(
                "raw object id must be {} bytes, got {}",
                Self::RAW_SIZE,
                bytes.len()
            ))
        })?;
        Ok(Oid(raw))
    }

    /// Raw digest bytes
    pub fn as_bytes(&self) -> &[u8; Self::RAW_SIZE] {
        &self.0
    }

    /// 40 lowercase hex characters
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a 40-character hex id
    ///
    /// Uppercase digits are accepted. Any other length or character fails
    /// with `InvalidFormat`.
    pub fn from_hex(s: &str) -> GitResult<Self> {
        if s.len() != Self::HEX_SIZE {
            return Err(GitError::invalid_format(format!(
                "object id must be {} hex characters, got {}: '{}'",
                Self::HEX_SIZE,
                s.len(),
                s
            )));
        }
        let mut bytes = [0u8; Self::RAW_SIZE];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|e| GitError::invalid_format(format!("invalid object id '{}': {}", s, e)))?;
        Ok(Oid(bytes))
    }

    /// True if `s` would parse as a full id
    pub fn is_valid_hex(s: &str) -> bool {
        s.len() == Self::HEX_SIZE && s.bytes().all(|b| b.is_ascii_hexdigit())
    }

    /// True if `s` can be used as an abbreviated id
    pub fn is_valid_prefix(s: &str) -> bool {
        (Self::MIN_PREFIX_LEN..=Self::HEX_SIZE).contains(&s.len())
            && s.bytes().all(|b| b.is_ascii_hexdigit())
    }

    /// Loose object path relative to `objects/`: `ab/cdef...`
    pub fn to_path(&self) -> String {
        let hex = self.to_hex();
        format!("{}/{}", &hex[..2], &hex[2..])
    }

    /// First `len` hex characters, clamped to 1..=40
    pub fn short(&self, len: usize) -> String {
        let mut hex = self.to_hex();
        hex.truncate(len.clamp(1, Self::HEX_SIZE));
        hex
    }

    /// The all-zero id, used for "no value" in ref updates
    pub const fn zero() -> Self {
        Oid([0u8; Self::RAW_SIZE])
    }

    /// True for the all-zero id
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// True if the hex form starts with `prefix` (case-insensitive)
    pub fn starts_with_hex(&self, prefix: &str) -> bool {
        self.to_hex().starts_with(&prefix.to_ascii_lowercase())
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Oid({})", self.short(10))
    }
}

impl FromStr for Oid {
    type Err = GitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Oid::from_hex(s)
    }
}

impl From<[u8; Oid::RAW_SIZE]> for Oid {
    fn from(bytes: [u8; Oid::RAW_SIZE]) -> Self {
        Oid(bytes)
    }
}

impl AsRef<[u8]> for Oid {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for Oid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Oid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Oid::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Incremental object hasher
///
/// Feeds the `"<type> <len>\0"` header first, then content as it arrives.
/// Used to verify stored objects without buffering their payload.
#[derive(Clone)]
pub struct ObjectHasher {
    inner: Sha1,
    consumed: u64,
}

impl ObjectHasher {
    /// Start hashing an object of `kind` whose content is `length` bytes
    pub fn new(kind: ObjectType, length: u64) -> Self {
        let mut inner = Sha1::new();
        inner.update(format!("{} {}\0", kind.as_str(), length).as_bytes());
        ObjectHasher { inner, consumed: 0 }
    }

    /// Feed content bytes
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
        self.consumed += data.len() as u64;
    }

    /// Content bytes fed so far
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Finish and return the id
    pub fn finish(self) -> Oid {
        let digest = self.inner.finalize();
        let mut bytes = [0u8; Oid::RAW_SIZE];
        bytes.copy_from_slice(&digest);
        Oid(bytes)
    }
}

impl io::Write for ObjectHasher {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl fmt::Debug for ObjectHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectHasher")
            .field("consumed", &self.consumed)
            .finish()
    }
}
