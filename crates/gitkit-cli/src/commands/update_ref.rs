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

//! Update or delete a reference with an optional compare-and-swap.

use crate::repo::RepoContext;
use anyhow::{Context, Result};
use clap::Parser;
use gitkit_versioning::{Oid, Repository};
use tracing::info;

/// Update or delete a reference, optionally checking its old value
#[derive(Parser, Debug)]
pub struct UpdateRefCmd {
    /// Delete the reference instead
    #[arg(short = 'd', long = "delete")]
    pub delete: bool,

    /// Reference to change, e.g. refs/heads/master or HEAD
    #[arg(value_name = "REF")]
    pub name: String,

    /// New value (any revision); with -d, the expected old value
    #[arg(value_name = "NEWVALUE")]
    pub new_value: Option<String>,

    /// Expected current value; 40 zeros or an empty string means "must not exist"
    #[arg(value_name = "OLDVALUE")]
    pub old_value: Option<String>,
}

impl UpdateRefCmd {
    pub fn execute(&self, ctx: &RepoContext) -> Result<()> {
        let repo = ctx.open()?;

        if self.delete {
            if let Some(expected) = &self.new_value {
                let expected = expected_value(&repo, expected)?;
                let current = repo.find_reference(&self.name)?.and_then(|r| r.id());
                if current != Some(expected) {
                    anyhow::bail!(
                        "cannot delete {}: expected {}, found {}",
                        self.name,
                        expected,
                        current.map(|id| id.to_hex()).unwrap_or_else(|| "nothing".to_string())
                    );
                }
            }
            repo.delete_reference(&self.name)
                .with_context(|| format!("Failed to delete {}", self.name))?;
            info!(name = %self.name, "deleted reference");
            return Ok(());
        }

        let Some(new_value) = &self.new_value else {
            anyhow::bail!("update-ref needs a new value");
        };
        let new = repo
            .rev_parse(new_value)
            .with_context(|| format!("{}: not a valid SHA1", new_value))?;
        let expected = match &self.old_value {
            Some(old) => Some(expected_value(&repo, old)?),
            None => None,
        };

        repo.update_reference(&self.name, new, expected)
            .with_context(|| format!("cannot lock ref '{}'", self.name))?;
        Ok(())
    }
}

fn expected_value(repo: &Repository, value: &str) -> Result<Oid> {
    if value.is_empty() {
        return Ok(Oid::zero());
    }
    if Oid::is_valid_hex(value) {
        return Ok(Oid::from_hex(value)?);
    }
    repo.rev_parse(value)
        .with_context(|| format!("{}: not a valid SHA1", value))
}
