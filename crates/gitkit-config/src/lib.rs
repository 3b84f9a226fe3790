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

//! Configuration management for Gitkit
//!
//! Settings are layered: built-in defaults, then an optional
//! `gitkit.toml` inside the git directory (TOML, YAML or JSON when loaded
//! explicitly), then `GITKIT_*` environment variables. The result is
//! validated before use.
//!
//! ```no_run
//! use gitkit_config::Config;
//!
//! let config = Config::load(".git").unwrap();
//! println!("HEAD starts on {}", config.core.default_branch);
//! ```

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigFormat, ConfigLoader, ENV_PREFIX};
pub use schema::*;
pub use validation::Validator;
