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

//! Read or point a symbolic reference.

use crate::repo::RepoContext;
use anyhow::{bail, Context, Result};
use clap::Parser;

/// Read or point a symbolic reference
#[derive(Parser, Debug)]
pub struct SymbolicRefCmd {
    /// Print the target without its refs/heads/ style prefix
    #[arg(long)]
    pub short: bool,

    /// Symbolic reference, usually HEAD
    #[arg(value_name = "NAME")]
    pub name: String,

    /// New target, e.g. refs/heads/topic
    #[arg(value_name = "REF")]
    pub target: Option<String>,
}

impl SymbolicRefCmd {
    pub fn execute(&self, ctx: &RepoContext) -> Result<()> {
        let repo = ctx.open()?;

        if let Some(target) = &self.target {
            if !target.starts_with("refs/") {
                bail!("refusing to point {} outside of refs/", self.name);
            }
            return repo
                .set_symbolic_reference(&self.name, target)
                .with_context(|| format!("Failed to update {}", self.name));
        }

        let reference = repo
            .find_reference(&self.name)?
            .with_context(|| format!("No such ref: {}", self.name))?;
        let Some(target) = reference.symbolic_target() else {
            bail!("ref {} is not a symbolic ref", self.name);
        };
        if self.short {
            let short = ["refs/heads/", "refs/tags/", "refs/remotes/"]
                .iter()
                .find_map(|prefix| target.strip_prefix(prefix))
                .unwrap_or(target);
            println!("{}", short);
        } else {
            println!("{}", target);
        }
        Ok(())
    }
}
