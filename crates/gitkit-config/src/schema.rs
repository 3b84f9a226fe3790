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

//! Configuration schema
//!
//! Every section is optional in the file; missing fields take the defaults
//! below.

use crate::error::{ConfigError, ConfigResult};
use crate::loader::ConfigLoader;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File name looked up inside the git directory
pub const CONFIG_FILE_NAME: &str = "gitkit.toml";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Repository defaults
    pub core: CoreConfig,

    /// Object database tuning
    pub odb: OdbConfig,

    /// Reference handling
    pub refs: RefsConfig,

    /// Logging settings
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load `<git_dir>/gitkit.toml` with environment overrides
    ///
    /// A missing file yields the defaults (still subject to overrides).
    pub fn load(git_dir: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = git_dir.as_ref().join(CONFIG_FILE_NAME);
        let loader = ConfigLoader::new();

        if path.exists() {
            loader.load_with_overrides(&path)
        } else {
            let mut config = Self::default();
            loader.apply_env_overrides(&mut config)?;
            Ok(config)
        }
    }

    /// Write the configuration to `<git_dir>/gitkit.toml`
    pub fn save(&self, git_dir: impl AsRef<Path>) -> ConfigResult<()> {
        let path = git_dir.as_ref().join(CONFIG_FILE_NAME);
        let toml_str = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializationError(e.to_string()))?;
        std::fs::write(&path, toml_str)?;
        Ok(())
    }
}

/// Repository defaults
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CoreConfig {
    /// Branch HEAD points at after `init`
    pub default_branch: String,

    /// Name used for new signatures
    pub user_name: Option<String>,

    /// Email used for new signatures
    pub user_email: Option<String>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        CoreConfig {
            default_branch: "master".to_string(),
            user_name: None,
            user_email: None,
        }
    }
}

/// Object database tuning
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OdbConfig {
    /// Maximum number of parsed objects kept in memory
    pub cache_capacity: u64,

    /// zlib level for new loose objects (0-9)
    pub compression_level: u32,

    /// Re-hash objects on every read
    pub verify_on_read: bool,
}

impl Default for OdbConfig {
    fn default() -> Self {
        OdbConfig {
            cache_capacity: 1000,
            compression_level: 6,
            verify_on_read: true,
        }
    }
}

/// Reference handling
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RefsConfig {
    /// Longest symbolic chain followed before giving up
    pub max_symbolic_depth: usize,

    /// Attempts to take a `.lock` file before reporting contention
    pub lock_retries: u32,

    /// Base delay between lock attempts, multiplied by the attempt number
    pub lock_backoff_ms: u64,
}

impl Default for RefsConfig {
    fn default() -> Self {
        RefsConfig {
            max_symbolic_depth: 5,
            lock_retries: 5,
            lock_backoff_ms: 10,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Filter directive, e.g. "info" or "gitkit_versioning=debug"
    pub log_level: String,

    /// pretty, compact or json
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        ObservabilityConfig {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.core.default_branch, "master");
        assert_eq!(config.odb.cache_capacity, 1000);
        assert_eq!(config.refs.max_symbolic_depth, 5);
        assert_eq!(config.observability.log_format, "pretty");
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let config: Config = toml::from_str("[refs]\nlock_retries = 2\n").unwrap();
        assert_eq!(config.refs.lock_retries, 2);
        assert_eq!(config.refs.max_symbolic_depth, 5);
        assert_eq!(config.odb, OdbConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.core.user_name = Some("Scott Chacon".to_string());
        config.odb.cache_capacity = 16;
        config.save(temp.path()).unwrap();

        let loaded = Config::load(temp.path()).unwrap();
        assert_eq!(loaded.core.user_name.as_deref(), Some("Scott Chacon"));
        assert_eq!(loaded.odb.cache_capacity, 16);
    }
}
