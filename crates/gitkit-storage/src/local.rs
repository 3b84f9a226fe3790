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

//! Local filesystem storage backend
//!
//! Stores objects in Git's loose-object layout under an `objects/`
//! directory:
//!
//! ```text
//! objects/
//! ├── a8/
//! │   └── 233120f6ad708f843d861ce2b7228ec4e3dec6
//! ├── info/       (ignored)
//! └── pack/       (ignored)
//! ```
//!
//! Writes go to a uniquely named temp file in the fan-out directory, are
//! fsynced, then renamed into place and marked read-only, the same way Git
//! writes loose objects.

use crate::{validate_key, StorageBackend, StorageError, StorageResult};
use std::fmt;
use std::fs;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Loose-object filesystem backend
#[derive(Clone)]
pub struct LocalBackend {
    root: PathBuf,
}

impl LocalBackend {
    /// Create a backend rooted at an `objects/` directory
    ///
    /// The directory is created if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Fails if the root path exists but is not a directory.
    pub fn new<P: AsRef<Path>>(root: P) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();

        if !root.exists() {
            fs::create_dir_all(&root)?;
        } else if !root.is_dir() {
            return Err(StorageError::backend(format!(
                "path exists but is not a directory: {}",
                root.display()
            )));
        }

        Ok(LocalBackend { root })
    }

    /// Open an existing `objects/` directory without creating anything
    pub fn open_existing<P: AsRef<Path>>(root: P) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(StorageError::backend(format!(
                "objects directory missing: {}",
                root.display()
            )));
        }
        Ok(LocalBackend { root })
    }

    /// Get the root path for this backend
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Fan-out path for a key: `root/ab/cdef…`
    fn object_path(&self, key: &str) -> PathBuf {
        let (dir, file) = key.split_at(2);
        self.root.join(dir).join(file)
    }

    fn write_atomic(&self, path: &Path, data: &[u8]) -> StorageResult<()> {
        let parent = path
            .parent()
            .ok_or_else(|| StorageError::backend("object path has no parent"))?;
        fs::create_dir_all(parent)?;

        let temp_path = parent.join(format!("tmp_obj_{}", uuid::Uuid::new_v4().simple()));
        let result = (|| -> std::io::Result<()> {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(data)?;
            file.sync_all()?;
            drop(file);

            let mut perms = fs::metadata(&temp_path)?.permissions();
            perms.set_readonly(true);
            fs::set_permissions(&temp_path, perms)?;

            fs::rename(&temp_path, path)
        })();

        if let Err(e) = result {
            let _ = fs::remove_file(&temp_path);
            // Lost a race against an identical writer.
            if path.exists() {
                return Ok(());
            }
            return Err(e.into());
        }
        Ok(())
    }
}

impl fmt::Debug for LocalBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalBackend")
            .field("root", &self.root)
            .finish()
    }
}

impl StorageBackend for LocalBackend {
    fn get(&self, key: &str) -> StorageResult<Vec<u8>> {
        validate_key(key)?;
        let path = self.object_path(key);
        fs::read(&path).map_err(|e| StorageError::from_io(key, e))
    }

    fn open(&self, key: &str) -> StorageResult<Box<dyn Read + Send>> {
        validate_key(key)?;
        let path = self.object_path(key);
        let file = fs::File::open(&path).map_err(|e| StorageError::from_io(key, e))?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn put(&self, key: &str, data: &[u8]) -> StorageResult<()> {
        validate_key(key)?;
        let path = self.object_path(key);

        if path.exists() {
            trace!(key = %key, "object already present, skipping write");
            return Ok(());
        }

        self.write_atomic(&path, data)?;
        debug!(key = %key, size = data.len(), "stored loose object");
        Ok(())
    }

    fn exists(&self, key: &str) -> StorageResult<bool> {
        validate_key(key)?;
        let path = self.object_path(key);
        Ok(fs::metadata(path).map(|m| m.is_file()).unwrap_or(false))
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        validate_key(key)?;
        let path = self.object_path(key);

        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                // Read-only files need write permission removed on some platforms.
                if let Ok(meta) = fs::metadata(&path) {
                    let mut perms = meta.permissions();
                    #[allow(clippy::permissions_set_readonly_false)]
                    perms.set_readonly(false);
                    fs::set_permissions(&path, perms)?;
                    return fs::remove_file(&path).map_err(|e| StorageError::from_io(key, e));
                }
                Err(StorageError::from_io(key, e))
            }
        }
    }

    fn list_objects(&self, prefix: &str) -> StorageResult<Vec<String>> {
        let mut results = Vec::new();

        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(results),
            Err(e) => return Err(e.into()),
        };

        for entry in entries {
            let entry = entry?;
            let dir_name = entry.file_name().to_string_lossy().to_string();

            // Only two-hex fan-out directories hold loose objects.
            if dir_name.len() != 2 || !dir_name.bytes().all(|b| b.is_ascii_hexdigit()) {
                continue;
            }
            if !entry.path().is_dir() {
                continue;
            }
            if prefix.len() >= 2 && !prefix.starts_with(dir_name.as_str()) {
                continue;
            }
            if prefix.len() < 2 && !dir_name.starts_with(prefix) {
                continue;
            }

            for file in fs::read_dir(entry.path())? {
                let file = file?;
                let file_name = file.file_name().to_string_lossy().to_string();
                if file_name.len() != 38 || !file_name.bytes().all(|b| b.is_ascii_hexdigit()) {
                    continue;
                }
                let key = format!("{}{}", dir_name, file_name);
                if key.starts_with(prefix) {
                    results.push(key);
                }
            }
        }

        results.sort();
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const KEY: &str = "a8233120f6ad708f843d861ce2b7228ec4e3dec6";

    fn backend() -> (LocalBackend, TempDir) {
        let temp = TempDir::new().unwrap();
        let backend = LocalBackend::new(temp.path().join("objects")).unwrap();
        (backend, temp)
    }

    #[test]
    fn test_new_creates_root_directory() {
        let (backend, _temp) = backend();
        assert!(backend.root().is_dir());
    }

    #[test]
    fn test_new_fails_with_file_path() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("not_a_dir");
        fs::write(&file, b"x").unwrap();
        assert!(LocalBackend::new(&file).is_err());
    }

    #[test]
    fn test_open_existing_requires_directory() {
        let temp = TempDir::new().unwrap();
        assert!(LocalBackend::open_existing(temp.path().join("missing")).is_err());
        assert!(LocalBackend::open_existing(temp.path()).is_ok());
    }

    #[test]
    fn test_put_uses_git_fanout() {
        let (backend, _temp) = backend();
        backend.put(KEY, b"data").unwrap();

        let expected = backend
            .root()
            .join("a8")
            .join("233120f6ad708f843d861ce2b7228ec4e3dec6");
        assert!(expected.is_file());
        assert!(fs::metadata(&expected).unwrap().permissions().readonly());
    }

    #[test]
    fn test_put_and_get() {
        let (backend, _temp) = backend();
        backend.put(KEY, b"hello").unwrap();
        assert_eq!(backend.get(KEY).unwrap(), b"hello");

        let mut buf = Vec::new();
        backend.open(KEY).unwrap().read_to_end(&mut buf).unwrap();
        assert_eq!(buf, b"hello");
    }

    #[test]
    fn test_put_existing_is_noop() {
        let (backend, _temp) = backend();
        backend.put(KEY, b"first").unwrap();
        backend.put(KEY, b"second").unwrap();
        assert_eq!(backend.get(KEY).unwrap(), b"first");
    }

    #[test]
    fn test_get_nonexistent() {
        let (backend, _temp) = backend();
        assert!(backend.get(KEY).unwrap_err().is_not_found());
        assert!(backend.open(KEY).err().unwrap().is_not_found());
        assert!(!backend.exists(KEY).unwrap());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let (backend, _temp) = backend();
        backend.put(KEY, b"data").unwrap();
        backend.delete(KEY).unwrap();
        assert!(!backend.exists(KEY).unwrap());
        backend.delete(KEY).unwrap();
    }

    #[test]
    fn test_list_objects_skips_pack_and_info() {
        let (backend, _temp) = backend();
        fs::create_dir_all(backend.root().join("pack")).unwrap();
        fs::create_dir_all(backend.root().join("info")).unwrap();
        fs::write(backend.root().join("pack").join("pack-1.idx"), b"x").unwrap();

        backend.put(KEY, b"1").unwrap();
        backend
            .put("a8ffffffffffffffffffffffffffffffffffffff", b"2")
            .unwrap();
        backend
            .put("1b8cbad43e867676df601306689fe7c3def5e689", b"3")
            .unwrap();

        let all = backend.list_objects("").unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.windows(2).all(|w| w[0] <= w[1]));

        assert_eq!(backend.list_objects("a8").unwrap().len(), 2);
        assert_eq!(backend.list_objects("a823").unwrap(), vec![KEY.to_string()]);
        assert_eq!(backend.list_objects("a").unwrap().len(), 2);
        assert!(backend.list_objects("ff").unwrap().is_empty());
    }

    #[test]
    fn test_concurrent_identical_writes() {
        let (backend, _temp) = backend();
        let backend = std::sync::Arc::new(backend);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let backend = std::sync::Arc::clone(&backend);
                std::thread::spawn(move || backend.put(KEY, b"same bytes"))
            })
            .collect();

        for handle in handles {
            handle.join().unwrap().unwrap();
        }
        assert_eq!(backend.get(KEY).unwrap(), b"same bytes");

        // No temp files left behind.
        let leftovers: Vec<_> = fs::read_dir(backend.root().join("a8"))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with("tmp_obj_"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
