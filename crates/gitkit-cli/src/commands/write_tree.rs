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

//! Write the index as tree objects.

use crate::repo::RepoContext;
use anyhow::{bail, Result};
use clap::Parser;
use gitkit_versioning::{FileMode, IndexEntry, Oid, Repository, Tree, TreeEntry};
use std::collections::BTreeMap;

/// Write the index as tree objects
#[derive(Parser, Debug)]
pub struct WriteTreeCmd {}

impl WriteTreeCmd {
    pub fn execute(&self, ctx: &RepoContext) -> Result<()> {
        let repo = ctx.open()?;
        let index = repo.index()?;
        if index.has_conflicts() {
            bail!("the index has unmerged entries");
        }
        let entries: Vec<(&str, &IndexEntry)> =
            index.iter().map(|e| (e.path.as_str(), e)).collect();
        let id = write_level(&repo, &entries)?;
        println!("{}", id);
        Ok(())
    }
}

/// Write one directory level; `entries` hold paths relative to it
fn write_level(repo: &Repository, entries: &[(&str, &IndexEntry)]) -> Result<Oid> {
    let mut tree = Tree::new();
    let mut subdirs: BTreeMap<&str, Vec<(&str, &IndexEntry)>> = BTreeMap::new();

    for &(path, entry) in entries {
        match path.split_once('/') {
            Some((dir, rest)) => subdirs.entry(dir).or_default().push((rest, entry)),
            None => tree.insert(TreeEntry::new(path, FileMode::from_u32(entry.mode)?, entry.id))?,
        }
    }
    for (dir, children) in subdirs {
        let id = write_level(repo, &children)?;
        tree.insert(TreeEntry::new(dir, FileMode::Tree, id))?;
    }
    Ok(repo.write_tree(&tree)?)
}
