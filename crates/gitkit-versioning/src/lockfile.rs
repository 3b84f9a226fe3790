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

//! `<file>.lock` guards, the way Git serializes writers
//!
//! The lock file is created exclusively, the new content is written into
//! it, and `commit` renames it over the target. Dropping an uncommitted
//! guard removes the lock.

use gitkit_config::RefsConfig;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// How hard to try for a contended lock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockPolicy {
    /// Attempts before giving up, at least one
    pub attempts: u32,
    /// Wait after the first failed attempt; grows linearly
    pub backoff: Duration,
}

impl LockPolicy {
    /// Try once, never wait
    pub fn no_retry() -> Self {
        LockPolicy {
            attempts: 1,
            backoff: Duration::ZERO,
        }
    }
}

impl Default for LockPolicy {
    fn default() -> Self {
        LockPolicy::from(&RefsConfig::default())
    }
}

impl From<&RefsConfig> for LockPolicy {
    fn from(config: &RefsConfig) -> Self {
        LockPolicy {
            attempts: config.lock_retries.max(1),
            backoff: Duration::from_millis(config.lock_backoff_ms),
        }
    }
}

/// Path of the lock guarding `target`
pub fn lock_path_for(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}

/// Held lock on a file
#[derive(Debug)]
pub struct LockFile {
    target: PathBuf,
    lock_path: PathBuf,
    file: Option<File>,
}

impl LockFile {
    /// Take the lock on `target`
    ///
    /// Fails with `ErrorKind::AlreadyExists` if another writer still holds
    /// it after every attempt.
    pub fn acquire(target: impl AsRef<Path>, policy: &LockPolicy) -> io::Result<Self> {
        let target = target.as_ref().to_path_buf();
        let lock_path = lock_path_for(&target);
        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let attempts = policy.attempts.max(1);
        for attempt in 1..=attempts {
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&lock_path)
            {
                Ok(file) => {
                    debug!(lock = %lock_path.display(), attempt, "acquired lock");
                    return Ok(LockFile {
                        target,
                        lock_path,
                        file: Some(file),
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    if attempt < attempts {
                        warn!(lock = %lock_path.display(), attempt, "lock is held, retrying");
                        thread::sleep(policy.backoff * attempt);
                    }
                }
                Err(e) => return Err(e),
            }
        }

        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("unable to lock {}", lock_path.display()),
        ))
    }

    /// File this lock protects
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Append to the pending content
    pub fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.write_all(data),
            None => Err(io::Error::other("lock already released")),
        }
    }

    /// Flush the pending content and move it over the target
    pub fn commit(mut self) -> io::Result<()> {
        let file = self
            .file
            .take()
            .ok_or_else(|| io::Error::other("lock already released"))?;
        file.sync_all()?;
        drop(file);
        fs::rename(&self.lock_path, &self.target)?;
        // Renamed away; nothing left for Drop to clean up.
        self.lock_path = PathBuf::new();
        Ok(())
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        self.file.take();
        if self.lock_path.as_os_str().is_empty() {
            return;
        }
        if let Err(e) = fs::remove_file(&self.lock_path) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(lock = %self.lock_path.display(), error = %e, "failed to remove lock");
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_commit_replaces_target() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("refs/heads/master");
        let mut lock = LockFile::acquire(&target, &LockPolicy::no_retry()).unwrap();
        assert!(lock_path_for(&target).exists());
        lock.write_all(b"8496071c1b46c854b31185ea97743be6a8774479\n").unwrap();
        lock.commit().unwrap();

        assert!(!lock_path_for(&target).exists());
        assert_eq!(
            fs::read_to_string(&target).unwrap(),
            "8496071c1b46c854b31185ea97743be6a8774479\n"
        );
    }

    #[test]
    fn test_drop_releases_lock() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("HEAD");
        {
            let _lock = LockFile::acquire(&target, &LockPolicy::no_retry()).unwrap();
            assert!(lock_path_for(&target).exists());
        }
        assert!(!lock_path_for(&target).exists());
        assert!(!target.exists());
    }

    #[test]
    fn test_contended_lock_gives_up() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("HEAD");
        let _held = LockFile::acquire(&target, &LockPolicy::no_retry()).unwrap();

        let policy = LockPolicy {
            attempts: 3,
            backoff: Duration::from_millis(1),
        };
        let err = LockFile::acquire(&target, &policy).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
    }

    #[test]
    fn test_policy_from_config() {
        let policy = LockPolicy::from(&RefsConfig::default());
        assert_eq!(policy.attempts, 5);
        assert_eq!(policy.backoff, Duration::from_millis(10));
    }
}
