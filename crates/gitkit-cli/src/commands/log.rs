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

//! Show commit history.

use crate::output;
use crate::repo::RepoContext;
use anyhow::{bail, Context, Result};
use clap::Parser;
use gitkit_versioning::{Commit, GitError, Oid, Sorting};

/// Show commit history
#[derive(Parser, Debug)]
pub struct LogCmd {
    /// Limit the number of commits shown
    #[arg(short = 'n', long = "max-count", value_name = "N")]
    pub max_count: Option<usize>,

    /// One line per commit: abbreviated id and summary
    #[arg(long)]
    pub oneline: bool,

    /// Never show a commit before all of its children
    #[arg(long)]
    pub topo_order: bool,

    /// Oldest commits first
    #[arg(long)]
    pub reverse: bool,

    /// Starting revision
    #[arg(value_name = "REV", default_value = "HEAD")]
    pub revision: String,

    /// Revisions whose history is left out, e.g. `^v1.0` given as `--not v1.0`
    #[arg(long = "not", value_name = "REV")]
    pub not: Vec<String>,
}

impl LogCmd {
    pub fn execute(&self, ctx: &RepoContext) -> Result<()> {
        let repo = ctx.open()?;

        let start = match repo.rev_parse(&self.revision) {
            Ok(id) => id,
            Err(GitError::ReferenceNotFound(_)) if self.revision == "HEAD" => {
                bail!("your current branch does not have any commits yet")
            }
            Err(e) => return Err(e).context(format!("bad revision '{}'", self.revision)),
        };

        let mut walk = repo.revwalk()?;
        walk.sorting(Sorting {
            time: true,
            topological: self.topo_order,
            reverse: self.reverse,
        });
        walk.push(start)?;
        for hidden in &self.not {
            walk.hide(repo.rev_parse(hidden).with_context(|| format!("bad revision '{}'", hidden))?)?;
        }

        let limit = self.max_count.unwrap_or(usize::MAX);
        for (shown, step) in walk.take(limit).enumerate() {
            let id = step?;
            let commit = repo
                .lookup_commit(&id)?
                .with_context(|| format!("{} is not a commit", id))?;
            if self.oneline {
                println!("{} {}", output::commit_header(&id.short(7)), commit.summary());
            } else {
                if shown > 0 {
                    println!();
                }
                print_commit(&id, &commit);
            }
        }
        Ok(())
    }
}

fn print_commit(id: &Oid, commit: &Commit) {
    println!("{}", output::commit_header(&format!("commit {}", id)));
    if commit.is_merge() {
        let parents: Vec<String> = commit.parents.iter().map(|p| p.short(7)).collect();
        println!("Merge: {}", parents.join(" "));
    }
    println!(
        "Author: {} <{}>",
        commit.author.name(),
        commit.author.email()
    );
    println!(
        "Date:   {}",
        commit.author.when().format("%a %b %-d %H:%M:%S %Y %z")
    );
    println!();
    for line in commit.message.trim_end_matches('\n').lines() {
        println!("    {}", line);
    }
}
