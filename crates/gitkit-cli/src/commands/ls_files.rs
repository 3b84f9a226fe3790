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

//! List the entries of the index.

use crate::repo::RepoContext;
use anyhow::Result;
use clap::Parser;

/// List the entries of the index
#[derive(Parser, Debug)]
pub struct LsFilesCmd {
    /// Show mode, id and stage number
    #[arg(short = 's', long)]
    pub stage: bool,
}

impl LsFilesCmd {
    pub fn execute(&self, ctx: &RepoContext) -> Result<()> {
        let repo = ctx.open()?;
        let index = repo.index()?;
        for entry in &index {
            if self.stage {
                println!("{:06o} {} {}\t{}", entry.mode, entry.id, entry.stage(), entry.path);
            } else {
                println!("{}", entry.path);
            }
        }
        Ok(())
    }
}
