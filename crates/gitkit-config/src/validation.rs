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

//! Configuration validation

use crate::error::{ConfigError, ConfigResult};
use crate::schema::{Config, CoreConfig, ObservabilityConfig, OdbConfig, RefsConfig};

/// Validation for a configuration section
pub trait Validator {
    /// Check every constraint of the section
    fn validate(&self) -> ConfigResult<()>;
}

impl Validator for Config {
    fn validate(&self) -> ConfigResult<()> {
        self.core.validate()?;
        self.odb.validate()?;
        self.refs.validate()?;
        self.observability.validate()?;
        Ok(())
    }
}

impl Validator for CoreConfig {
    fn validate(&self) -> ConfigResult<()> {
        let branch = self.default_branch.as_str();
        if branch.is_empty() {
            return Err(ConfigError::MissingRequired("core.default_branch".to_string()));
        }
        let bad_char = branch
            .chars()
            .any(|c| c.is_ascii_control() || " ~^:?*[\\".contains(c));
        if bad_char
            || branch.starts_with('/')
            || branch.ends_with('/')
            || branch.ends_with(".lock")
            || branch.contains("..")
        {
            return Err(ConfigError::invalid_value(
                "core.default_branch",
                format!("not a valid branch name: {}", branch),
            ));
        }
        if let Some(email) = &self.user_email {
            if email.contains('<') || email.contains('>') || email.contains('\n') {
                return Err(ConfigError::invalid_value(
                    "core.user_email",
                    "must not contain '<', '>' or newlines",
                ));
            }
        }
        Ok(())
    }
}

impl Validator for OdbConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.compression_level > 9 {
            return Err(ConfigError::invalid_value(
                "odb.compression_level",
                format!("must be between 0 and 9, got {}", self.compression_level),
            ));
        }
        Ok(())
    }
}

impl Validator for RefsConfig {
    fn validate(&self) -> ConfigResult<()> {
        if !(1..=64).contains(&self.max_symbolic_depth) {
            return Err(ConfigError::invalid_value(
                "refs.max_symbolic_depth",
                format!("must be between 1 and 64, got {}", self.max_symbolic_depth),
            ));
        }
        if self.lock_retries == 0 {
            return Err(ConfigError::invalid_value(
                "refs.lock_retries",
                "at least one attempt is required",
            ));
        }
        if self.lock_backoff_ms > 10_000 {
            return Err(ConfigError::invalid_value(
                "refs.lock_backoff_ms",
                "must not exceed 10000",
            ));
        }
        Ok(())
    }
}

impl Validator for ObservabilityConfig {
    fn validate(&self) -> ConfigResult<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        // Directives like "gitkit_versioning=debug" are checked by the subscriber.
        if !self.log_level.contains('=')
            && !valid_levels.contains(&self.log_level.to_lowercase().as_str())
        {
            return Err(ConfigError::invalid_value(
                "observability.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["pretty", "compact", "json"];
        if !valid_formats.contains(&self.log_format.to_lowercase().as_str()) {
            return Err(ConfigError::invalid_value(
                "observability.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }
        Ok(())
    }
}
