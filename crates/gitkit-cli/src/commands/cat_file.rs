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

//! Show type, size or content of an object.

use crate::repo::RepoContext;
use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use gitkit_versioning::{GitError, GitObject, ObjectBody};
use std::io::{self, Write};

/// Show type, size or content of an object
#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("mode").required(true).args(["kind", "size", "pretty", "exists"])))]
pub struct CatFileCmd {
    /// Print the object type
    #[arg(short = 't')]
    pub kind: bool,

    /// Print the object size in bytes
    #[arg(short = 's')]
    pub size: bool,

    /// Pretty-print the object content
    #[arg(short = 'p')]
    pub pretty: bool,

    /// Exit with status 0 if the object exists, 1 otherwise
    #[arg(short = 'e')]
    pub exists: bool,

    /// Object to show
    #[arg(value_name = "OBJECT")]
    pub object: String,
}

impl CatFileCmd {
    pub fn execute(&self, ctx: &RepoContext) -> Result<()> {
        let repo = ctx.open()?;

        if self.exists {
            let found = match repo.rev_parse(&self.object) {
                Ok(id) => repo.exists(&id)?,
                Err(GitError::ObjectNotFound(_) | GitError::ReferenceNotFound(_)) => false,
                Err(e) => return Err(e.into()),
            };
            if !found {
                repo.close();
                std::process::exit(1);
            }
            return Ok(());
        }

        let id = repo
            .rev_parse(&self.object)
            .with_context(|| format!("Not a valid object name {}", self.object))?;

        if self.kind || self.size {
            let header = repo.read_header(&id)?;
            if self.kind {
                println!("{}", header.kind);
            } else {
                println!("{}", header.length);
            }
            return Ok(());
        }

        let raw = repo.read(&id)?;
        let mut stdout = io::stdout().lock();
        match GitObject::from_raw(&raw)?.into_body() {
            ObjectBody::Tree(tree) => {
                for entry in tree.iter() {
                    writeln!(
                        stdout,
                        "{:06o} {} {}\t{}",
                        entry.mode.as_u32(),
                        entry.mode.object_type(),
                        entry.id,
                        entry.name
                    )?;
                }
            }
            _ => stdout.write_all(raw.data())?,
        }
        stdout.flush()?;
        Ok(())
    }
}
