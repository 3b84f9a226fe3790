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

//! Configuration loading: file format detection, parsing, env overrides

use crate::error::{ConfigError, ConfigResult};
use crate::schema::Config;
use crate::validation::Validator;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "GITKIT_";

/// Configuration format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `.toml`
    Toml,
    /// `.yaml` / `.yml`
    Yaml,
    /// `.json`
    Json,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(ConfigFormat::Toml),
            Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
            Some("json") => Ok(ConfigFormat::Json),
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => Err(ConfigError::InvalidPath(path.to_path_buf())),
        }
    }

    /// Get format name as string
    pub fn name(&self) -> &'static str {
        match self {
            ConfigFormat::Toml => "TOML",
            ConfigFormat::Yaml => "YAML",
            ConfigFormat::Json => "JSON",
        }
    }
}

/// Configuration loader
#[derive(Debug)]
pub struct ConfigLoader {
    validate: bool,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        ConfigLoader { validate: true }
    }

    /// Create a loader without validation
    pub fn without_validation() -> Self {
        ConfigLoader { validate: false }
    }

    /// Load configuration from a file
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<Config> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let format = ConfigFormat::from_path(path)?;
        let content = std::fs::read_to_string(path)?;

        info!(
            format = format.name(),
            path = %path.display(),
            "loaded configuration file"
        );

        self.load_from_string(&content, format)
    }

    /// Load configuration from a string
    pub fn load_from_string(&self, content: &str, format: ConfigFormat) -> ConfigResult<Config> {
        let config: Config = match format {
            ConfigFormat::Toml => toml::from_str(content)?,
            ConfigFormat::Yaml => serde_yaml::from_str(content)?,
            ConfigFormat::Json => serde_json::from_str(content)?,
        };

        if self.validate {
            config.validate()?;
        }

        Ok(config)
    }

    /// Load a file, then apply `GITKIT_*` environment overrides
    pub fn load_with_overrides<P: AsRef<Path>>(&self, path: P) -> ConfigResult<Config> {
        let mut config = self.load_file(path)?;
        self.apply_env_overrides(&mut config)?;
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&self, config: &mut Config) -> ConfigResult<()> {
        self.apply_overrides_from(config, |name| std::env::var(name).ok())
    }

    /// Apply overrides read through `lookup`
    ///
    /// `lookup` receives full variable names such as `GITKIT_LOG_LEVEL`.
    pub fn apply_overrides_from<F>(&self, config: &mut Config, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |suffix: &str| {
            let name = format!("{}{}", ENV_PREFIX, suffix);
            lookup(&name).map(|value| (name, value))
        };

        if let Some((_, value)) = var("DEFAULT_BRANCH") {
            config.core.default_branch = value;
        }
        if let Some((_, value)) = var("USER_NAME") {
            config.core.user_name = Some(value);
        }
        if let Some((_, value)) = var("USER_EMAIL") {
            config.core.user_email = Some(value);
        }

        if let Some((name, value)) = var("CACHE_CAPACITY") {
            config.odb.cache_capacity = parse_number(&name, &value)?;
        }
        if let Some((name, value)) = var("COMPRESSION_LEVEL") {
            config.odb.compression_level = parse_number(&name, &value)?;
        }
        if let Some((name, value)) = var("VERIFY_ON_READ") {
            config.odb.verify_on_read = parse_bool(&name, &value)?;
        }

        if let Some((name, value)) = var("MAX_SYMREF_DEPTH") {
            config.refs.max_symbolic_depth = parse_number(&name, &value)?;
        }
        if let Some((name, value)) = var("LOCK_RETRIES") {
            config.refs.lock_retries = parse_number(&name, &value)?;
        }
        if let Some((name, value)) = var("LOCK_BACKOFF_MS") {
            config.refs.lock_backoff_ms = parse_number(&name, &value)?;
        }

        if let Some((_, value)) = var("LOG_LEVEL") {
            config.observability.log_level = value;
        }
        if let Some((_, value)) = var("LOG_FORMAT") {
            config.observability.log_format = value;
        }

        if self.validate {
            config.validate()?;
        }
        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_number<T: FromStr>(name: &str, value: &str) -> ConfigResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::env_var_parsing_error(name, value, "expected a non-negative integer"))
}

/// Parse boolean from string (accepts: true, false, yes, no, 1, 0, on, off)
fn parse_bool(name: &str, value: &str) -> ConfigResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        _ => Err(ConfigError::env_var_parsing_error(
            name,
            value,
            "expected 'true', 'false', 'yes', 'no', '1', '0', 'on', or 'off'",
        )),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(ConfigFormat::from_path("gitkit.toml").unwrap(), ConfigFormat::Toml);
        assert_eq!(ConfigFormat::from_path("gitkit.yaml").unwrap(), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path("gitkit.yml").unwrap(), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path("gitkit.json").unwrap(), ConfigFormat::Json);
        assert!(ConfigFormat::from_path("gitkit.ini").is_err());
        assert!(ConfigFormat::from_path("gitkit").is_err());
    }

    #[test]
    fn test_parse_bool() {
        for truthy in ["true", "YES", "1", "on"] {
            assert!(parse_bool("X", truthy).unwrap());
        }
        for falsy in ["false", "no", "0", "OFF"] {
            assert!(!parse_bool("X", falsy).unwrap());
        }
        assert!(parse_bool("X", "maybe").is_err());
    }

    #[test]
    fn test_parse_each_format() {
        let loader = ConfigLoader::new();

        let toml = "[core]\ndefault_branch = \"main\"\n";
        let json = r#"{"core": {"default_branch": "main"}}"#;
        let yaml = "core:\n  default_branch: main\n";

        for (content, format) in [
            (toml, ConfigFormat::Toml),
            (json, ConfigFormat::Json),
            (yaml, ConfigFormat::Yaml),
        ] {
            let config = loader.load_from_string(content, format).unwrap();
            assert_eq!(config.core.default_branch, "main", "{}", format.name());
        }
    }

    #[test]
    fn test_validation_runs_on_load() {
        let content = "[odb]\ncompression_level = 12\n";
        assert!(ConfigLoader::new()
            .load_from_string(content, ConfigFormat::Toml)
            .is_err());
        assert!(ConfigLoader::without_validation()
            .load_from_string(content, ConfigFormat::Toml)
            .is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let loader = ConfigLoader::new();
        let mut config = Config::default();
        loader
            .apply_overrides_from(
                &mut config,
                env(&[
                    ("GITKIT_DEFAULT_BRANCH", "trunk"),
                    ("GITKIT_CACHE_CAPACITY", "42"),
                    ("GITKIT_VERIFY_ON_READ", "off"),
                    ("GITKIT_MAX_SYMREF_DEPTH", "3"),
                    ("GITKIT_LOG_FORMAT", "json"),
                ]),
            )
            .unwrap();

        assert_eq!(config.core.default_branch, "trunk");
        assert_eq!(config.odb.cache_capacity, 42);
        assert!(!config.odb.verify_on_read);
        assert_eq!(config.refs.max_symbolic_depth, 3);
        assert_eq!(config.observability.log_format, "json");
    }

    #[test]
    fn test_env_override_parse_error_names_variable() {
        let mut config = Config::default();
        let err = ConfigLoader::new()
            .apply_overrides_from(&mut config, env(&[("GITKIT_LOCK_RETRIES", "many")]))
            .unwrap_err();
        assert!(err.to_string().contains("GITKIT_LOCK_RETRIES"));
    }
}
