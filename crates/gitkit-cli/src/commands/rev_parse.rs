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

//! Resolve revisions to object ids.

use crate::repo::RepoContext;
use anyhow::{Context, Result};
use clap::Parser;
use gitkit_versioning::Oid;

/// Resolve revisions to object ids
#[derive(Parser, Debug)]
pub struct RevParseCmd {
    /// Print abbreviated ids of this many digits
    #[arg(long, value_name = "N", num_args = 0..=1, require_equals = true, default_missing_value = "7")]
    pub short: Option<usize>,

    /// Print the repository's git directory instead
    #[arg(long, conflicts_with = "revisions")]
    pub git_dir: bool,

    /// Revisions such as `HEAD~2`, `v1.0^{}` or an abbreviated id
    #[arg(value_name = "REV", required_unless_present = "git_dir")]
    pub revisions: Vec<String>,
}

impl RevParseCmd {
    pub fn execute(&self, ctx: &RepoContext) -> Result<()> {
        let repo = ctx.open()?;
        if self.git_dir {
            println!("{}", repo.path().display());
            return Ok(());
        }
        for rev in &self.revisions {
            let id = repo
                .rev_parse(rev)
                .with_context(|| format!("ambiguous argument '{}'", rev))?;
            println!("{}", self.format(&id));
        }
        Ok(())
    }

    fn format(&self, id: &Oid) -> String {
        match self.short {
            Some(len) => id.short(len.clamp(4, Oid::HEX_SIZE)),
            None => id.to_hex(),
        }
    }
}
