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

mod commands;
mod output;
mod repo;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use commands::*;
use gitkit_config::{Config, ConfigLoader, ENV_PREFIX};
use gitkit_observability::{init_tracing_with_config, LogConfig, LogFormat};
use repo::RepoContext;
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gitkit")]
#[command(version, about = "Git-compatible object store plumbing")]
#[command(
    long_about = "gitkit reads and writes Git repositories directly: loose objects,
references, the index and commit history."
)]
#[command(propagate_version = true)]
#[command(author = "Gitkit Contributors")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Colored output (always|auto|never)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Run as if started in PATH
    #[arg(short = 'C', global = true, value_name = "PATH")]
    directory: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty repository
    Init(InitCmd),

    /// Show type, size or content of an object
    #[command(name = "cat-file")]
    CatFile(CatFileCmd),

    /// Compute an object id, optionally storing the object
    #[command(name = "hash-object")]
    HashObject(HashObjectCmd),

    /// Resolve revisions to object ids
    #[command(name = "rev-parse")]
    RevParse(RevParseCmd),

    /// List references
    #[command(name = "show-ref")]
    ShowRef(ShowRefCmd),

    /// Update or delete a reference, optionally checking its old value
    #[command(name = "update-ref")]
    UpdateRef(UpdateRefCmd),

    /// Read or point a symbolic reference
    #[command(name = "symbolic-ref")]
    SymbolicRef(SymbolicRefCmd),

    /// Show commit history
    Log(LogCmd),

    /// List the entries of a tree
    #[command(name = "ls-tree")]
    LsTree(LsTreeCmd),

    /// List the entries of the index
    #[command(name = "ls-files")]
    LsFiles(LsFilesCmd),

    /// Stage work-tree files
    Add(AddCmd),

    /// Write the index as tree objects
    #[command(name = "write-tree")]
    WriteTree(WriteTreeCmd),

    /// Create a commit object from a tree
    #[command(name = "commit-tree")]
    CommitTree(CommitTreeCmd),

    /// Create, list or delete tags
    Tag(TagCmd),

    /// Show version information
    Version,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli) {
        output::warning(&format!("logging disabled: {:#}", e));
    }

    match cli.color.as_str() {
        "never" => console::set_colors_enabled(false),
        "always" => console::set_colors_enabled(true),
        "auto" => {}
        other => {
            output::error(&format!("Invalid color option: {}", other));
            std::process::exit(2);
        }
    }

    let ctx = RepoContext::new(cli.directory.clone(), cli.quiet);
    let result = run(cli.command, &ctx);

    if let Err(e) = result {
        output::error(&format!("Error: {:#}", e));
        std::process::exit(1);
    }
}

fn run(command: Commands, ctx: &RepoContext) -> Result<()> {
    match command {
        Commands::Init(cmd) => cmd.execute(ctx),
        Commands::CatFile(cmd) => cmd.execute(ctx),
        Commands::HashObject(cmd) => cmd.execute(ctx),
        Commands::RevParse(cmd) => cmd.execute(ctx),
        Commands::ShowRef(cmd) => cmd.execute(ctx),
        Commands::UpdateRef(cmd) => cmd.execute(ctx),
        Commands::SymbolicRef(cmd) => cmd.execute(ctx),
        Commands::Log(cmd) => cmd.execute(ctx),
        Commands::LsTree(cmd) => cmd.execute(ctx),
        Commands::LsFiles(cmd) => cmd.execute(ctx),
        Commands::Add(cmd) => cmd.execute(ctx),
        Commands::WriteTree(cmd) => cmd.execute(ctx),
        Commands::CommitTree(cmd) => cmd.execute(ctx),
        Commands::Tag(cmd) => cmd.execute(ctx),
        Commands::Version => {
            print_version();
            Ok(())
        }
        Commands::Completions { shell } => {
            generate_completions(shell);
            Ok(())
        }
    }
}

/// Logs go to stderr so stdout stays parseable.
///
/// Without `-v`, `-q` or `GITKIT_LOG_LEVEL`, only warnings are shown.
fn init_logging(cli: &Cli) -> Result<()> {
    let mut config = Config::default();
    ConfigLoader::new()
        .apply_env_overrides(&mut config)
        .context("Invalid GITKIT_* environment settings")?;

    let level = if cli.verbose {
        "debug".to_string()
    } else if cli.quiet {
        "error".to_string()
    } else if std::env::var_os(format!("{}LOG_LEVEL", ENV_PREFIX)).is_some() {
        config.observability.log_level.clone()
    } else {
        "warn".to_string()
    };
    let format: LogFormat = config
        .observability
        .log_format
        .parse()
        .context("Invalid log format")?;

    let log_config = LogConfig::new()
        .with_format(format)
        .with_level(level)
        .with_timestamps(false)
        .with_color(std::env::var_os("NO_COLOR").is_none());
    init_tracing_with_config(log_config).context("Failed to initialize logging")
}

fn print_version() {
    println!("gitkit {}", env!("CARGO_PKG_VERSION"));
    println!("rust-version: {}", env!("CARGO_PKG_RUST_VERSION"));
    println!("license: {}", env!("CARGO_PKG_LICENSE"));
}

fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "gitkit", &mut io::stdout());
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["gitkit", "init", "-q", "-C", "/tmp/x"]).unwrap();
        assert!(cli.quiet);
        assert_eq!(cli.directory, Some(PathBuf::from("/tmp/x")));
        assert!(matches!(cli.command, Commands::Init(_)));
    }
}
