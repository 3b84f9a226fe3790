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

//! In-memory mock storage backend for testing
//!
//! Thread-safe implementation of [`StorageBackend`](crate::StorageBackend)
//! using `Arc<RwLock<HashMap>>`.

use crate::{validate_key, StorageBackend, StorageError, StorageResult};
use std::collections::HashMap;
use std::fmt;
use std::io::{Cursor, Read};
use std::sync::{Arc, PoisonError, RwLock};

/// In-memory mock storage backend for testing
#[derive(Clone)]
pub struct MockBackend {
    store: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

fn poisoned<T>(_: PoisonError<T>) -> StorageError {
    StorageError::backend("mock store lock poisoned")
}

impl MockBackend {
    /// Create a new empty mock storage backend
    pub fn new() -> Self {
        MockBackend {
            store: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create a mock storage backend with initial data
    pub fn with_data(initial_data: HashMap<String, Vec<u8>>) -> Self {
        MockBackend {
            store: Arc::new(RwLock::new(initial_data)),
        }
    }

    /// Get the current number of objects stored
    pub fn len(&self) -> usize {
        self.store.read().map(|s| s.len()).unwrap_or(0)
    }

    /// Check if the storage is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Overwrite a stored value, bypassing the write-once rule.
    ///
    /// Lets tests simulate on-disk corruption.
    pub fn corrupt(&self, key: &str, data: Vec<u8>) -> StorageResult<()> {
        self.store
            .write()
            .map_err(poisoned)?
            .insert(key.to_string(), data);
        Ok(())
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MockBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockBackend").finish()
    }
}

impl StorageBackend for MockBackend {
    fn get(&self, key: &str) -> StorageResult<Vec<u8>> {
        validate_key(key)?;
        let store = self.store.read().map_err(poisoned)?;
        store
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::not_found(key))
    }

    fn open(&self, key: &str) -> StorageResult<Box<dyn Read + Send>> {
        let data = self.get(key)?;
        Ok(Box::new(Cursor::new(data)))
    }

    fn put(&self, key: &str, data: &[u8]) -> StorageResult<()> {
        validate_key(key)?;
        let mut store = self.store.write().map_err(poisoned)?;
        store
            .entry(key.to_string())
            .or_insert_with(|| data.to_vec());
        Ok(())
    }

    fn exists(&self, key: &str) -> StorageResult<bool> {
        validate_key(key)?;
        let store = self.store.read().map_err(poisoned)?;
        Ok(store.contains_key(key))
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        validate_key(key)?;
        let mut store = self.store.write().map_err(poisoned)?;
        store.remove(key);
        Ok(())
    }

    fn list_objects(&self, prefix: &str) -> StorageResult<Vec<String>> {
        let store = self.store.read().map_err(poisoned)?;
        let mut keys: Vec<String> = store
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }
}
