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

//! Create an empty repository.
//!
//! Lays out `.git/` (or the bare directory itself) with `HEAD`, `config`,
//! `objects/` and `refs/`.

use crate::output;
use crate::repo::RepoContext;
use anyhow::{Context, Result};
use clap::Parser;
use gitkit_config::{Config, ConfigLoader};
use gitkit_versioning::Repository;
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Create an empty repository
#[derive(Parser, Debug)]
pub struct InitCmd {
    /// Directory to initialize (defaults to the current directory)
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Create a bare repository
    #[arg(long)]
    pub bare: bool,

    /// Branch HEAD points at (default: core.default_branch)
    #[arg(short = 'b', long, value_name = "BRANCH")]
    pub initial_branch: Option<String>,
}

impl InitCmd {
    pub fn execute(&self, ctx: &RepoContext) -> Result<()> {
        let target = match &self.path {
            Some(path) => ctx.resolve_path(path)?,
            None => ctx.start_dir()?,
        };
        fs::create_dir_all(&target)
            .with_context(|| format!("Failed to create directory: {}", target.display()))?;

        let mut config = Config::default();
        ConfigLoader::new().apply_env_overrides(&mut config)?;
        if let Some(branch) = &self.initial_branch {
            config.core.default_branch = branch.clone();
        }
        let branch = config.core.default_branch.clone();

        info!(path = %target.display(), bare = self.bare, "initializing repository");
        let repo = Repository::init_with_config(&target, self.bare, config)
            .with_context(|| format!("Failed to initialize {}", target.display()))?;

        if !ctx.quiet() {
            output::success(&format!(
                "Initialized empty Git repository in {}",
                repo.path().display()
            ));
            output::detail("Initial branch", &branch);
        }
        Ok(())
    }
}
