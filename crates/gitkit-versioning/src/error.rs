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

//! Error taxonomy for repository operations

use gitkit_compression::CompressionError;
use gitkit_config::ConfigError;
use gitkit_storage::StorageError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for repository operations
pub type GitResult<T> = Result<T, GitError>;

/// Errors raised by the object store, refs, index and repository façade
#[derive(Error, Debug)]
pub enum GitError {
    /// The path has no `HEAD`, `objects/` and `refs/`
    #[error("not a git repository: {}", .0.display())]
    NotARepository(PathBuf),

    /// `init` found an existing repository
    #[error("repository already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    /// A well-formed id (or prefix) names no stored object
    #[error("object not found: {0}")]
    ObjectNotFound(String),

    /// No loose or packed reference with this name
    #[error("reference not found: {0}")]
    ReferenceNotFound(String),

    /// A reference with this name already exists
    #[error("reference already exists: {0}")]
    ReferenceExists(String),

    /// Stored data failed a hash, length or zlib check
    #[error("corrupt object {id}: {reason}")]
    Corrupt {
        /// Object id (or file) that failed
        id: String,
        /// What didn't match
        reason: String,
    },

    /// Malformed caller input: hex id, ref name, object bytes
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// Cyclic, over-long or dangling symbolic reference chain
    #[error("invalid reference state for '{name}': {reason}")]
    InvalidReferenceState {
        /// Reference where resolution started
        name: String,
        /// Why resolution stopped
        reason: String,
    },

    /// Compare-and-swap on a reference lost a race
    #[error("concurrent update of {name}: expected {expected}, found {actual}")]
    ConcurrentRefUpdate {
        /// Reference being updated
        name: String,
        /// Value the caller expected
        expected: String,
        /// Value (or lock state) actually observed
        actual: String,
    },

    /// An abbreviated id matches several objects
    #[error("short id {prefix} is ambiguous ({count} candidates)")]
    Ambiguous {
        /// Prefix as given
        prefix: String,
        /// Number of matching objects
        count: usize,
    },

    /// The repository handle was closed
    #[error("repository handle used after close")]
    UseAfterDispose,

    /// A long-running walk observed its cancellation token
    #[error("operation cancelled")]
    Cancelled,

    /// Storage backend failure other than a missing key
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Compressing a new object failed
    #[error(transparent)]
    Compression(#[from] CompressionError),

    /// Configuration could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl GitError {
    /// Create a Corrupt error
    pub fn corrupt(id: impl ToString, reason: impl Into<String>) -> Self {
        GitError::Corrupt {
            id: id.to_string(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidFormat error
    pub fn invalid_format(msg: impl Into<String>) -> Self {
        GitError::InvalidFormat(msg.into())
    }

    /// Create an InvalidReferenceState error
    pub fn invalid_reference_state(name: impl Into<String>, reason: impl Into<String>) -> Self {
        GitError::InvalidReferenceState {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// True for ObjectNotFound and ReferenceNotFound
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            GitError::ObjectNotFound(_) | GitError::ReferenceNotFound(_)
        )
    }

    /// True for Corrupt
    pub fn is_corrupt(&self) -> bool {
        matches!(self, GitError::Corrupt { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = GitError::corrupt("8496071c", "hash mismatch");
        assert_eq!(err.to_string(), "corrupt object 8496071c: hash mismatch");
        assert!(err.is_corrupt());
        assert!(!err.is_not_found());

        let err = GitError::ConcurrentRefUpdate {
            name: "refs/heads/master".into(),
            expected: "aaaa".into(),
            actual: "bbbb".into(),
        };
        assert!(err.to_string().contains("refs/heads/master"));
    }

    #[test]
    fn test_not_found_kinds() {
        assert!(GitError::ObjectNotFound("x".into()).is_not_found());
        assert!(GitError::ReferenceNotFound("x".into()).is_not_found());
        assert!(!GitError::UseAfterDispose.is_not_found());
    }
}
