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

//! Storage abstraction layer for Gitkit
//!
//! This crate provides the blocking key/value interface the object database
//! sits on:
//! - [`LocalBackend`]: Git's loose-object layout (`objects/ab/cdef…`)
//! - [`MockBackend`]: in-memory store for tests
//!
//! # Core Concepts
//!
//! - **Keys**: 40-character hex object ids. The local backend fans them out
//!   into a two-character directory and a 38-character file name.
//! - **Objects**: opaque bytes (already deflated by the caller)
//! - **Prefixes**: plain string prefixes, used for abbreviated id lookup
//!
//! # Contract
//!
//! 1. Every call is synchronous and may block on the filesystem
//! 2. Implementations are `Send + Sync + Debug`
//! 3. `get` on a missing key returns [`StorageError::NotFound`]
//! 4. `put` on an existing key leaves the stored bytes untouched
//! 5. `delete` of a missing key succeeds
//! 6. `list_objects` returns sorted keys
//!
//! # Examples
//!
//! ```no_run
//! use gitkit_storage::{StorageBackend, MockBackend};
//!
//! fn main() -> gitkit_storage::StorageResult<()> {
//!     let storage = MockBackend::new();
//!     let key = "a8233120f6ad708f843d861ce2b7228ec4e3dec6";
//!
//!     storage.put(key, b"deflated bytes")?;
//!     assert!(storage.exists(key)?);
//!     assert_eq!(storage.get(key)?, b"deflated bytes");
//!     assert_eq!(storage.list_objects("a823")?.len(), 1);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod local;
pub mod mock;

use std::fmt::Debug;
use std::io::Read;

pub use error::{StorageError, StorageResult};
pub use local::LocalBackend;
pub use mock::MockBackend;

/// Storage backend trait for content-addressed object storage
///
/// All operations block the calling thread. Concurrency is obtained by
/// sharing one backend (behind an `Arc`) between worker threads.
pub trait StorageBackend: Send + Sync + Debug {
    /// Retrieve an object by its key
    ///
    /// # Errors
    ///
    /// - [`StorageError::NotFound`] if the key doesn't exist
    /// - [`StorageError::InvalidKey`] if the key is malformed
    /// - [`StorageError::Io`] for other filesystem failures
    fn get(&self, key: &str) -> StorageResult<Vec<u8>>;

    /// Open an object for streaming reads
    ///
    /// Used by header-only reads, which stop consuming the stream early.
    fn open(&self, key: &str) -> StorageResult<Box<dyn Read + Send>>;

    /// Store an object with the given key
    ///
    /// Writes are atomic: a reader sees either nothing or the complete
    /// object. Storing a key that already exists is a successful no-op.
    fn put(&self, key: &str, data: &[u8]) -> StorageResult<()>;

    /// Check if an object exists
    fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Delete an object (idempotent)
    fn delete(&self, key: &str) -> StorageResult<()>;

    /// List keys starting with `prefix`, sorted
    fn list_objects(&self, prefix: &str) -> StorageResult<Vec<String>>;
}

/// Reject keys that could escape the storage root or can't be fanned out.
pub(crate) fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::invalid_key("key cannot be empty"));
    }
    if key.len() < 3 {
        return Err(StorageError::invalid_key(format!(
            "key too short for fan-out: {}",
            key
        )));
    }
    if !key.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(StorageError::invalid_key(format!(
            "key must be alphanumeric: {}",
            key
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trait_is_object_safe() {
        fn _check_object_safe(_: &dyn StorageBackend) {}
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("a8233120f6ad708f843d861ce2b7228ec4e3dec6").is_ok());
        assert!(validate_key("").unwrap_err().is_invalid_key());
        assert!(validate_key("ab").unwrap_err().is_invalid_key());
        assert!(validate_key("../etc/passwd").unwrap_err().is_invalid_key());
        assert!(validate_key("ab/cd").unwrap_err().is_invalid_key());
    }
}
