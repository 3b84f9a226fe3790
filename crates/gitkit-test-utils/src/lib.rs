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

//! # Gitkit Test Utilities
//!
//! Shared test utilities for Gitkit crates providing:
//! - CLI command helpers for testing the `gitkit` binary
//! - Temporary repositories laid out the way Git lays them out
//! - Known Git objects whose ids were computed by Git itself
//! - Custom assertions for on-disk repository state
//!
//! Objects are encoded here with flate2 and sha1 directly, so tests can
//! check the object database against an encoder it doesn't share code with.

pub mod assertions;
pub mod cli;
pub mod fixtures;
pub mod repo;

pub use assertions::*;
pub use cli::{gitkit, GitkitCommand};
pub use fixtures::{Fixture, TestFixtures};
pub use repo::TestRepo;
