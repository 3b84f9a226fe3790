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

//! Stage work-tree files.

use crate::repo::RepoContext;
use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Stage work-tree files
#[derive(Parser, Debug)]
pub struct AddCmd {
    /// Files to stage
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,
}

impl AddCmd {
    pub fn execute(&self, ctx: &RepoContext) -> Result<()> {
        let repo = ctx.open()?;
        let Some(workdir) = repo.workdir().map(Path::to_path_buf) else {
            bail!("this operation must be run in a work tree");
        };
        let start = ctx.start_dir()?.canonicalize()?;

        for path in &self.paths {
            let absolute = start.join(path);
            let relative = index_path(&workdir, &absolute)
                .with_context(|| format!("'{}' is outside repository", path.display()))?;
            let entry = repo
                .add_to_index(&relative)
                .with_context(|| format!("Failed to add {}", relative))?;
            debug!(path = %entry.path, id = %entry.id, "staged");
        }
        Ok(())
    }
}

/// `/`-separated path of `absolute` inside `workdir`
fn index_path(workdir: &Path, absolute: &Path) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();
    for component in absolute.strip_prefix(workdir).ok()?.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?.to_string()),
            Component::CurDir => {}
            Component::ParentDir => {
                parts.pop()?;
            }
            _ => return None,
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}
