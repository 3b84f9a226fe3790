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

//! Create, list or delete tags.
//!
//! With `-m` an annotated tag object is written; otherwise the tag is a
//! plain reference under `refs/tags/`.

use crate::output;
use crate::repo::RepoContext;
use anyhow::{bail, Context, Result};
use clap::Parser;
use gitkit_versioning::{GitError, Oid, Repository};

/// Create, list or delete tags
#[derive(Parser, Debug)]
pub struct TagCmd {
    /// Annotated tag message
    #[arg(short = 'm', long, value_name = "MESSAGE")]
    pub message: Option<String>,

    /// Replace an existing tag
    #[arg(short = 'f', long)]
    pub force: bool,

    /// Delete the named tags
    #[arg(short = 'd', long, conflicts_with_all = ["message", "force"])]
    pub delete: bool,

    /// List tags (the default without a name)
    #[arg(short = 'l', long)]
    pub list: bool,

    /// Tag name, then the object to tag (default HEAD); with -d, tag names
    #[arg(value_name = "ARGS")]
    pub args: Vec<String>,
}

impl TagCmd {
    pub fn execute(&self, ctx: &RepoContext) -> Result<()> {
        let repo = ctx.open()?;

        if self.delete {
            if self.args.is_empty() {
                bail!("tag -d needs at least one tag name");
            }
            for name in &self.args {
                let ref_name = format!("refs/tags/{}", name);
                let id = repo
                    .find_reference(&ref_name)?
                    .and_then(|r| r.id())
                    .with_context(|| format!("tag '{}' not found", name))?;
                repo.delete_reference(&ref_name)?;
                if !ctx.quiet() {
                    println!("Deleted tag '{}' (was {})", name, id.short(7));
                }
            }
            return Ok(());
        }

        if self.list || self.args.is_empty() {
            return list_tags(&repo);
        }

        let name = &self.args[0];
        let target = self.args.get(1).map(String::as_str).unwrap_or("HEAD");
        if self.args.len() > 2 {
            bail!("too many arguments");
        }
        let target_id = repo
            .rev_parse(target)
            .with_context(|| format!("Failed to resolve '{}' as a valid ref", target))?;

        match &self.message {
            Some(message) => {
                let tagger = repo.default_signature().context(
                    "Set GITKIT_USER_NAME and GITKIT_USER_EMAIL to create annotated tags",
                )?;
                let message = format!("{}\n", message.trim_end_matches('\n'));
                repo.create_tag(name, &target_id, &tagger, &message, self.force)
                    .map_err(|e| already_exists(e, name))?;
            }
            None => {
                let expected = if self.force { None } else { Some(Oid::zero()) };
                repo.update_reference(&format!("refs/tags/{}", name), target_id, expected)
                    .map_err(|e| already_exists(e, name))?;
            }
        }

        if !ctx.quiet() {
            output::success(&format!("Created tag '{}' at {}", name, target_id.short(7)));
        }
        Ok(())
    }
}

fn list_tags(repo: &Repository) -> Result<()> {
    let refs = repo.references()?;
    for tag in refs.iter().filter(|r| r.is_tag()) {
        println!("{}", tag.short_name());
    }
    Ok(())
}

fn already_exists(err: GitError, name: &str) -> anyhow::Error {
    match err {
        GitError::ReferenceExists(_) | GitError::ConcurrentRefUpdate { .. } => {
            anyhow::anyhow!("tag '{}' already exists", name)
        }
        other => other.into(),
    }
}
