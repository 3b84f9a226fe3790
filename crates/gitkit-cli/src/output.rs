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

//! Shared output formatting for CLI commands.
//!
//! Status messages carry a colored marker; machine-readable command output
//! (ids, listings, object content) is printed plainly by the commands.

use console::style;

/// Print a success message with a green check mark.
///
/// ```ignore
/// output::success("Initialized empty Git repository in /tmp/demo/.git");
/// // Output: ✔ Initialized empty Git repository in /tmp/demo/.git
/// ```
pub fn success(msg: &str) {
    println!("{} {}", style("✔").green().bold(), msg);
}

/// Print an error message to stderr with a red cross.
pub fn error(msg: &str) {
    eprintln!("{} {}", style("✘").red().bold(), msg);
}

/// Print a warning to stderr.
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("!").yellow().bold(), msg);
}

/// Print a detail line with key-value formatting.
///
/// The value is highlighted in cyan.
pub fn detail(key: &str, value: &str) {
    println!("  {}: {}", key, style(value).cyan());
}

/// Yellow commit header line used by `log`
pub fn commit_header(line: &str) -> String {
    style(line).yellow().to_string()
}
