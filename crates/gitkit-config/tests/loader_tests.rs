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

use gitkit_config::{Config, ConfigError, ConfigLoader, Validator, CONFIG_FILE_NAME};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_load_toml_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("settings.toml");
    fs::write(
        &path,
        r#"
[core]
default_branch = "main"
user_name = "Vicent Marti"
user_email = "tanoku@gmail.com"

[odb]
cache_capacity = 64
compression_level = 9

[refs]
max_symbolic_depth = 8
"#,
    )
    .unwrap();

    let config = ConfigLoader::new().load_file(&path).unwrap();
    assert_eq!(config.core.default_branch, "main");
    assert_eq!(config.core.user_email.as_deref(), Some("tanoku@gmail.com"));
    assert_eq!(config.odb.cache_capacity, 64);
    assert_eq!(config.odb.compression_level, 9);
    assert_eq!(config.refs.max_symbolic_depth, 8);
    assert!(config.validate().is_ok());
}

#[test]
fn test_load_yaml_and_json_files() {
    let temp = TempDir::new().unwrap();

    let yaml = temp.path().join("settings.yml");
    fs::write(&yaml, "observability:\n  log_level: debug\n  log_format: compact\n").unwrap();
    let config = ConfigLoader::new().load_file(&yaml).unwrap();
    assert_eq!(config.observability.log_level, "debug");

    let json = temp.path().join("settings.json");
    fs::write(&json, r#"{"refs": {"lock_retries": 3}}"#).unwrap();
    let config = ConfigLoader::new().load_file(&json).unwrap();
    assert_eq!(config.refs.lock_retries, 3);
}

#[test]
fn test_missing_file_is_reported() {
    let temp = TempDir::new().unwrap();
    let err = ConfigLoader::new()
        .load_file(temp.path().join("absent.toml"))
        .unwrap_err();
    assert!(matches!(err, ConfigError::FileNotFound(_)));
}

#[test]
fn test_repository_config_absent_gives_defaults() {
    let temp = TempDir::new().unwrap();
    assert!(!temp.path().join(CONFIG_FILE_NAME).exists());
    let config = Config::load(temp.path()).unwrap();
    assert_eq!(config.refs.lock_retries, Config::default().refs.lock_retries);
}

#[test]
fn test_invalid_file_rejected() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join(CONFIG_FILE_NAME),
        "[refs]\nmax_symbolic_depth = 0\n",
    )
    .unwrap();
    let err = Config::load(temp.path()).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { .. }));
}
