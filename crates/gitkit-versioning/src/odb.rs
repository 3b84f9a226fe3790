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

//! Object Database (ODB) over loose objects
//!
//! - **Content addressing**: an object's id is the SHA-1 of its loose
//!   encoding, so identical content is stored once
//! - **Verification**: every read re-hashes the inflated bytes and checks the
//!   declared length; mismatches surface as `Corrupt`, never as "not found"
//! - **Caching**: recently read or written objects are kept in a bounded
//!   moka cache
//! - **Metrics**: hit/miss, write and integrity counters

use crate::error::{GitError, GitResult};
use crate::metrics::OdbMetrics;
use crate::object::{GitObject, ObjectBody, ObjectType};
use crate::oid::{ObjectHasher, Oid};
use crate::raw::{encode_loose, parse_loose_header, Header, RawObject, MAX_HEADER_LEN};
use gitkit_compression::{CompressionLevel, Compressor, ZlibCompressor};
use gitkit_config::OdbConfig;
use gitkit_storage::{StorageBackend, StorageError};
use moka::sync::Cache;
use std::fmt;
use std::io::{self, BufRead, BufReader, Read};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Read/write access to a repository's objects
///
/// # Examples
///
/// ```
/// use gitkit_storage::MockBackend;
/// use gitkit_versioning::{ObjectDatabase, ObjectType};
/// use std::sync::Arc;
///
/// let odb = ObjectDatabase::new(Arc::new(MockBackend::new()), 100);
/// let id = odb.write(ObjectType::Blob, b"hey there\n").unwrap();
/// assert_eq!(id.to_hex(), "a8233120f6ad708f843d861ce2b7228ec4e3dec6");
///
/// let header = odb.read_header(&id).unwrap();
/// assert_eq!(header.length, 10);
/// ```
pub struct ObjectDatabase {
    /// Loose-object store keyed by hex id
    storage: Arc<dyn StorageBackend>,

    /// zlib codec for the loose encoding
    compressor: Arc<dyn Compressor>,

    /// Recently used objects
    cache: Cache<Oid, Arc<RawObject>>,

    metrics: Mutex<OdbMetrics>,

    /// Re-hash objects on read
    verify_on_read: bool,
}

impl ObjectDatabase {
    /// Database with Git's default zlib level and verification on
    pub fn new(storage: Arc<dyn StorageBackend>, cache_capacity: u64) -> Self {
        Self::with_options(
            storage,
            Arc::new(ZlibCompressor::default_level()),
            cache_capacity,
            true,
        )
    }

    /// Database with an explicit codec and verification setting
    pub fn with_options(
        storage: Arc<dyn StorageBackend>,
        compressor: Arc<dyn Compressor>,
        cache_capacity: u64,
        verify_on_read: bool,
    ) -> Self {
        debug!(
            capacity = cache_capacity,
            verify_on_read, "creating object database"
        );
        ObjectDatabase {
            storage,
            compressor,
            cache: Cache::new(cache_capacity),
            metrics: Mutex::new(OdbMetrics::new()),
            verify_on_read,
        }
    }

    /// Database configured from the `[odb]` settings
    pub fn from_config(storage: Arc<dyn StorageBackend>, config: &OdbConfig) -> GitResult<Self> {
        let level = CompressionLevel::from_level(config.compression_level)?;
        Ok(Self::with_options(
            storage,
            Arc::new(ZlibCompressor::new(level)),
            config.cache_capacity,
            config.verify_on_read,
        ))
    }

    fn record(&self, update: impl FnOnce(&mut OdbMetrics)) {
        let mut metrics = self.metrics.lock().unwrap_or_else(|e| e.into_inner());
        update(&mut metrics);
    }

    fn corrupt(&self, id: &Oid, reason: impl Into<String>) -> GitError {
        let reason = reason.into();
        warn!(oid = %id, reason = %reason, "object failed integrity check");
        self.record(OdbMetrics::record_corrupt);
        GitError::corrupt(id, reason)
    }

    fn storage_error(id: &Oid, err: StorageError) -> GitError {
        if err.is_not_found() {
            GitError::ObjectNotFound(id.to_hex())
        } else {
            GitError::Storage(err)
        }
    }

    /// True if the object is stored
    ///
    /// Storage errors read as "absent"; this never fails.
    pub fn exists(&self, id: &Oid) -> bool {
        if self.cache.contains_key(id) {
            return true;
        }
        match self.storage.exists(&id.to_hex()) {
            Ok(found) => found,
            Err(e) => {
                debug!(oid = %id, error = %e, "existence check failed");
                false
            }
        }
    }

    /// Type and length of an object
    ///
    /// The inflated stream is hashed as it is read, so the check costs no
    /// more memory than the header.
    pub fn read_header(&self, id: &Oid) -> GitResult<Header> {
        if let Some(cached) = self.cache.get(id) {
            return Ok(*cached.header());
        }
        self.record(OdbMetrics::record_header_read);

        let reader = self
            .storage
            .open(&id.to_hex())
            .map_err(|e| Self::storage_error(id, e))?;
        let mut inflated = BufReader::new(self.compressor.decoder(reader));

        let mut header = Vec::with_capacity(32);
        (&mut inflated)
            .take(MAX_HEADER_LEN as u64)
            .read_until(0, &mut header)
            .map_err(|e| self.corrupt(id, format!("zlib stream error: {}", e)))?;
        let (kind, length, _) = parse_loose_header(&header)
            .map_err(|e| self.corrupt(id, format!("bad header: {}", e)))?;

        if self.verify_on_read {
            let mut hasher = ObjectHasher::new(kind, length);
            io::copy(&mut inflated, &mut hasher)
                .map_err(|e| self.corrupt(id, format!("zlib stream error: {}", e)))?;
            if hasher.consumed() != length {
                return Err(self.corrupt(
                    id,
                    format!(
                        "declared length {} but inflated {} bytes",
                        length,
                        hasher.consumed()
                    ),
                ));
            }
            let actual = hasher.finish();
            if actual != *id {
                return Err(self.corrupt(id, format!("content hashes to {}", actual)));
            }
        }

        debug!(oid = %id, kind = %kind, length, "read object header");
        Ok(Header::new(*id, kind, length))
    }

    /// Full object: header plus inflated content
    pub fn read(&self, id: &Oid) -> GitResult<RawObject> {
        if let Some(cached) = self.cache.get(id) {
            debug!(oid = %id, "cache hit");
            self.record(OdbMetrics::record_cache_hit);
            return Ok((*cached).clone());
        }
        self.record(OdbMetrics::record_cache_miss);

        let stored = self
            .storage
            .get(&id.to_hex())
            .map_err(|e| Self::storage_error(id, e))?;
        let inflated = self
            .compressor
            .decompress(&stored)
            .map_err(|e| self.corrupt(id, e.to_string()))?;

        let (kind, length, header_len) = parse_loose_header(&inflated)
            .map_err(|e| self.corrupt(id, format!("bad header: {}", e)))?;
        let content_len = (inflated.len() - header_len) as u64;
        if content_len != length {
            return Err(self.corrupt(
                id,
                format!(
                    "declared length {} but inflated {} bytes",
                    length, content_len
                ),
            ));
        }
        if self.verify_on_read {
            let actual = Oid::hash(&inflated);
            if actual != *id {
                return Err(self.corrupt(id, format!("content hashes to {}", actual)));
            }
        }

        let raw = RawObject::new(
            Header::new(*id, kind, length),
            inflated[header_len..].to_vec(),
        );
        debug!(oid = %id, kind = %kind, length, "read object from storage");
        self.cache.insert(*id, Arc::new(raw.clone()));
        Ok(raw)
    }

    /// Read and parse an object
    pub fn read_object(&self, id: &Oid) -> GitResult<GitObject> {
        GitObject::from_raw(&self.read(id)?)
    }

    /// Store content as an object of `kind`
    ///
    /// Writing an id that is already stored leaves the existing file alone.
    pub fn write(&self, kind: ObjectType, data: &[u8]) -> GitResult<Oid> {
        let id = Oid::hash_object(kind, data);
        let key = id.to_hex();

        let stored = if self.storage.exists(&key)? {
            debug!(oid = %id, "object already stored");
            None
        } else {
            let loose = encode_loose(kind, data);
            let compressed = self.compressor.compress(&loose)?;
            self.storage.put(&key, &compressed)?;
            let stats = self.compressor.metrics(&loose, &compressed);
            info!(
                oid = %id,
                kind = %kind,
                size = data.len(),
                stored = compressed.len(),
                ratio = stats.compression_ratio,
                "stored new object"
            );
            Some(compressed.len() as u64)
        };
        self.record(|m| m.record_write(data.len() as u64, stored));

        let header = Header::new(id, kind, data.len() as u64);
        self.cache
            .insert(id, Arc::new(RawObject::new(header, data.to_vec())));
        Ok(id)
    }

    /// Serialize and store a typed object
    pub fn write_object(&self, body: &ObjectBody) -> GitResult<Oid> {
        self.write(body.kind(), &body.serialize())
    }

    /// Expand an abbreviated id
    ///
    /// `prefix` is 4 to 40 hex characters. Fails with `Ambiguous` when more
    /// than one stored object matches and `ObjectNotFound` when none does.
    pub fn find_by_prefix(&self, prefix: &str) -> GitResult<Oid> {
        if !Oid::is_valid_prefix(prefix) {
            return Err(GitError::invalid_format(format!(
                "object id prefix must be {} to {} hex characters: '{}'",
                Oid::MIN_PREFIX_LEN,
                Oid::HEX_SIZE,
                prefix
            )));
        }
        let prefix = prefix.to_ascii_lowercase();
        if prefix.len() == Oid::HEX_SIZE {
            let id = Oid::from_hex(&prefix)?;
            return if self.exists(&id) {
                Ok(id)
            } else {
                Err(GitError::ObjectNotFound(prefix))
            };
        }

        let matches = self.storage.list_objects(&prefix)?;
        match matches.as_slice() {
            [] => Err(GitError::ObjectNotFound(prefix)),
            [only] => Oid::from_hex(only),
            many => Err(GitError::Ambiguous {
                prefix,
                count: many.len(),
            }),
        }
    }

    /// Ids of every stored object, sorted
    pub fn list(&self) -> GitResult<Vec<Oid>> {
        self.storage
            .list_objects("")?
            .iter()
            .map(|key| Oid::from_hex(key))
            .collect()
    }

    /// Snapshot of the counters
    pub fn metrics(&self) -> OdbMetrics {
        self.metrics
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Drop every cached object
    pub fn clear_cache(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks();
    }

    /// Number of cached objects
    pub fn cache_entry_count(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }
}

impl fmt::Debug for ObjectDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectDatabase")
            .field("storage", &self.storage)
            .field("verify_on_read", &self.verify_on_read)
            .finish()
    }
}
