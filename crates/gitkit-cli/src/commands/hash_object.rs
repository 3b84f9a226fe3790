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

//! Compute object ids, optionally writing the objects.

use crate::repo::RepoContext;
use anyhow::{Context, Result};
use clap::Parser;
use gitkit_versioning::{parser_for, ObjectType, Oid};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

/// Compute an object id, optionally storing the object
#[derive(Parser, Debug)]
pub struct HashObjectCmd {
    /// Write the object into the object database
    #[arg(short = 'w')]
    pub write: bool,

    /// Object type
    #[arg(short = 't', value_name = "TYPE", default_value = "blob")]
    pub kind: String,

    /// Read the content from standard input
    #[arg(long)]
    pub stdin: bool,

    /// Files to hash
    #[arg(value_name = "FILE", required_unless_present = "stdin")]
    pub files: Vec<PathBuf>,
}

impl HashObjectCmd {
    pub fn execute(&self, ctx: &RepoContext) -> Result<()> {
        let kind = ObjectType::parse(&self.kind)?;
        let repo = if self.write { Some(ctx.open()?) } else { None };

        let mut inputs = Vec::new();
        if self.stdin {
            let mut data = Vec::new();
            io::stdin()
                .read_to_end(&mut data)
                .context("Failed to read standard input")?;
            inputs.push(data);
        }
        for file in &self.files {
            let path = ctx.resolve_path(file)?;
            inputs.push(fs::read(&path).with_context(|| format!("Cannot read {}", path.display()))?);
        }

        for data in inputs {
            // Typed objects must parse before they may be stored.
            if kind != ObjectType::Blob {
                parser_for(kind)(&data).with_context(|| format!("Content is not a valid {}", kind))?;
            }
            let id = match &repo {
                Some(repo) => repo.write(kind, &data)?,
                None => Oid::hash_object(kind, &data),
            };
            println!("{}", id);
        }
        Ok(())
    }
}
