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

//! List references.

use crate::repo::RepoContext;
use anyhow::Result;
use clap::Parser;
use gitkit_versioning::{GitError, ObjectType, Reference, Repository};

/// List references
#[derive(Parser, Debug)]
pub struct ShowRefCmd {
    /// Only branches under refs/heads/
    #[arg(long)]
    pub heads: bool,

    /// Only tags under refs/tags/
    #[arg(long)]
    pub tags: bool,

    /// Include HEAD
    #[arg(long)]
    pub head: bool,

    /// Also print the object each annotated tag points at, as `<name>^{}`
    #[arg(short = 'd', long)]
    pub dereference: bool,

    /// Only references whose name ends with one of these patterns
    #[arg(value_name = "PATTERN")]
    pub patterns: Vec<String>,
}

impl ShowRefCmd {
    pub fn execute(&self, ctx: &RepoContext) -> Result<()> {
        let repo = ctx.open()?;

        let mut refs: Vec<Reference> = Vec::new();
        if self.head {
            if let Some(id) = repo.head_id()? {
                refs.push(Reference::direct("HEAD", id));
            }
        }
        refs.extend(repo.references()?.into_iter().filter(|r| self.selects(r)));

        let mut shown = 0usize;
        for reference in &refs {
            // Symbolic refs under refs/ print the id they resolve to.
            let id = match reference.id() {
                Some(id) => id,
                None => match repo.rev_parse(reference.name()) {
                    Ok(id) => id,
                    Err(GitError::ReferenceNotFound(_)) => continue,
                    Err(e) => return Err(e.into()),
                },
            };
            println!("{} {}", id, reference.name());
            shown += 1;

            if self.dereference {
                if let Some(peeled) = peeled_tag(&repo, reference)? {
                    println!("{} {}^{{}}", peeled, reference.name());
                }
            }
        }

        if shown == 0 {
            repo.close();
            std::process::exit(1);
        }
        Ok(())
    }

    fn selects(&self, reference: &Reference) -> bool {
        let kind_ok = match (self.heads, self.tags) {
            (false, false) => true,
            (heads, tags) => (heads && reference.is_branch()) || (tags && reference.is_tag()),
        };
        let pattern_ok = self.patterns.is_empty()
            || self.patterns.iter().any(|p| {
                reference.name() == p || reference.name().ends_with(&format!("/{}", p))
            });
        kind_ok && pattern_ok
    }
}

/// Target of an annotated tag, using the packed-refs peel line when present
fn peeled_tag(repo: &Repository, reference: &Reference) -> Result<Option<gitkit_versioning::Oid>> {
    if let Some(peeled) = reference.peeled() {
        return Ok(Some(peeled));
    }
    let Some(id) = reference.id() else {
        return Ok(None);
    };
    if repo.read_header(&id)?.kind != ObjectType::Tag {
        return Ok(None);
    }
    Ok(Some(repo.peel(&id, None)?))
}
