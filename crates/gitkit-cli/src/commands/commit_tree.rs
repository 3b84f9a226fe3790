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

//! Create a commit object from a tree.

use crate::repo::RepoContext;
use anyhow::{Context, Result};
use clap::Parser;
use gitkit_versioning::{ObjectType, Oid};
use std::io::{self, Read};

/// Create a commit object from a tree
#[derive(Parser, Debug)]
pub struct CommitTreeCmd {
    /// Parent commit, repeatable
    #[arg(short = 'p', value_name = "PARENT")]
    pub parents: Vec<String>,

    /// Commit message; read from stdin when absent
    #[arg(short = 'm', value_name = "MESSAGE")]
    pub message: Option<String>,

    /// Tree (or commit, whose tree is used)
    #[arg(value_name = "TREE")]
    pub tree: String,
}

impl CommitTreeCmd {
    pub fn execute(&self, ctx: &RepoContext) -> Result<()> {
        let repo = ctx.open()?;
        let tree = repo
            .rev_parse(&self.tree)
            .with_context(|| format!("Not a valid object name {}", self.tree))?;
        let tree = repo.peel(&tree, Some(ObjectType::Tree))?;

        let parents = self
            .parents
            .iter()
            .map(|p| {
                let id = repo
                    .rev_parse(p)
                    .with_context(|| format!("Not a valid object name {}", p))?;
                Ok(repo.peel(&id, Some(ObjectType::Commit))?)
            })
            .collect::<Result<Vec<Oid>>>()?;

        let message = match &self.message {
            Some(message) => format!("{}\n", message.trim_end_matches('\n')),
            None => {
                let mut message = String::new();
                io::stdin()
                    .read_to_string(&mut message)
                    .context("Failed to read commit message")?;
                message
            }
        };

        let signature = repo
            .default_signature()
            .context("Set GITKIT_USER_NAME and GITKIT_USER_EMAIL (or core.user_name / core.user_email in gitkit.toml)")?;
        let id = repo.create_commit(None, &signature, &signature, &message, &tree, &parents)?;
        println!("{}", id);
        Ok(())
    }
}
