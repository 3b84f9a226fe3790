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
//! Object store and repository model for Gitkit
//!
//! This crate implements the Git-compatible core:
//! - SHA-1 object ids over Git's loose object encoding
//! - Typed commits, trees, blobs and annotated tags that serialize back to
//!   the exact bytes Git writes
//! - A verifying object database with a moka read cache and metrics
//! - Loose and packed references with lock-file compare-and-swap
//! - The binary `index` (DIRC versions 2 and 3)
//! - Revision parsing and history walking
//!
//! # Architecture
//!
//! The object database (ODB) sits on a `StorageBackend` from
//! `gitkit-storage` and a `Compressor` from `gitkit-compression`:
//!
//! - **Content Addressing**: an object's id is the SHA-1 of
//!   `"<type> <len>\0" + content`
//! - **Verification**: reads re-hash and length-check the inflated bytes
//! - **Caching**: recently used objects are kept in a bounded cache
//!
//! [`Repository`] owns one ODB and one [`RefDatabase`] for a git directory.
//!
//! # Examples
//!
//! ```
//! use gitkit_versioning::{ObjectDatabase, ObjectType};
//! use gitkit_storage::MockBackend;
//! use std::sync::Arc;
//!
//! let odb = ObjectDatabase::new(Arc::new(MockBackend::new()), 1000);
//!
//! let oid = odb.write(ObjectType::Blob, b"hey there\n").unwrap();
//! assert_eq!(oid.to_hex(), "a8233120f6ad708f843d861ce2b7228ec4e3dec6");
//!
//! let object = odb.read(&oid).unwrap();
//! assert_eq!(object.data(), b"hey there\n");
//!
//! let metrics = odb.metrics();
//! println!("Cache hit rate: {:.1}%", metrics.hit_rate() * 100.0);
//! ```

mod commit;
mod error;
mod headers;
mod index;
mod lockfile;
mod metrics;
mod object;
mod odb;
mod oid;
mod raw;
mod refs;
mod repository;
mod revision;
mod revwalk;
mod signature;
mod tag;
mod tree;

pub use commit::Commit;
pub use error::{GitError, GitResult};
pub use index::{Index, IndexEntry, IndexTime};
pub use lockfile::{lock_path_for, LockFile, LockPolicy};
pub use metrics::OdbMetrics;
pub use object::{parser_for, Blob, BodyParser, GitObject, ObjectBody, ObjectType};
pub use odb::ObjectDatabase;
pub use oid::{ObjectHasher, Oid};
pub use raw::{encode_loose, parse_loose_header, Header, RawObject, MAX_HEADER_LEN};
pub use refs::{validate_name, RefDatabase, RefTarget, Reference, PACKED_REFS};
pub use repository::Repository;
pub use revision::{dwim_candidates, peel, resolve_revision};
pub use revwalk::{CancellationToken, RevisionWalker, Sorting};
pub use signature::{offset_minutes, to_date_time_offset, to_seconds_since_epoch, Signature};
pub use tag::Tag;
pub use tree::{FileMode, Tree, TreeEntry};
