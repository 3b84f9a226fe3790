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

//! List the entries of a tree.

use crate::repo::RepoContext;
use anyhow::{Context, Result};
use clap::Parser;
use gitkit_versioning::{ObjectType, Repository, Tree};

/// List the entries of a tree
#[derive(Parser, Debug)]
pub struct LsTreeCmd {
    /// Recurse into subtrees
    #[arg(short = 'r')]
    pub recursive: bool,

    /// Only print paths
    #[arg(long)]
    pub name_only: bool,

    /// Tree, commit or tag to list
    #[arg(value_name = "TREE-ISH")]
    pub treeish: String,
}

impl LsTreeCmd {
    pub fn execute(&self, ctx: &RepoContext) -> Result<()> {
        let repo = ctx.open()?;
        let id = repo
            .rev_parse(&self.treeish)
            .with_context(|| format!("Not a valid object name {}", self.treeish))?;
        let tree_id = repo
            .peel(&id, Some(ObjectType::Tree))
            .context("not a tree object")?;
        let tree = repo
            .lookup_tree(&tree_id)?
            .context("not a tree object")?;
        self.print(&repo, &tree, "")
    }

    fn print(&self, repo: &Repository, tree: &Tree, prefix: &str) -> Result<()> {
        for entry in tree.iter() {
            let path = format!("{}{}", prefix, entry.name);
            if self.recursive && entry.is_tree() {
                let subtree = repo
                    .lookup_tree(&entry.id)?
                    .with_context(|| format!("missing tree {} for {}", entry.id, path))?;
                self.print(repo, &subtree, &format!("{}/", path))?;
                continue;
            }
            if self.name_only {
                println!("{}", path);
            } else {
                println!(
                    "{:06o} {} {}\t{}",
                    entry.mode.as_u32(),
                    entry.mode.object_type(),
                    entry.id,
                    path
                );
            }
        }
        Ok(())
    }
}
