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

//! Revision parsing and resolution
//!
//! A revision is a base followed by any number of suffixes:
//! - base: full id, reference name (`HEAD`, `master`, `v1.0`,
//!   `refs/heads/x`, `origin`), or an abbreviated id of at least 4 hex digits
//! - `~N`: N-th ancestor through first parents (`~` alone is `~1`)
//! - `^N`: N-th parent (`^` alone is `^1`, `^0` is the commit itself)
//! - `^{}`: peel annotated tags
//! - `^{commit}`, `^{tree}`, `^{blob}`, `^{tag}`, `^{object}`: peel to a type

use crate::error::{GitError, GitResult};
use crate::object::{ObjectBody, ObjectType};
use crate::odb::ObjectDatabase;
use crate::oid::Oid;
use crate::refs::{validate_name, RefDatabase};
use tracing::debug;

/// Reference names tried for a short name, in order
pub fn dwim_candidates(name: &str) -> [String; 6] {
    [
        name.to_string(),
        format!("refs/{}", name),
        format!("refs/tags/{}", name),
        format!("refs/heads/{}", name),
        format!("refs/remotes/{}", name),
        format!("refs/remotes/{}/HEAD", name),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Suffix {
    Ancestor(usize),
    Parent(usize),
    Peel(Option<PeelTarget>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PeelTarget {
    Kind(ObjectType),
    Object,
}

/// Split a revision into its base and suffixes
fn parse(spec: &str) -> GitResult<(&str, Vec<Suffix>)> {
    let split = spec.find(['~', '^']).unwrap_or(spec.len());
    let (base, mut rest) = spec.split_at(split);
    if base.is_empty() {
        return Err(GitError::invalid_format(format!(
            "revision '{}' has no base",
            spec
        )));
    }

    let bad = || GitError::invalid_format(format!("invalid revision suffix in '{}'", spec));
    let mut suffixes = Vec::new();
    while let Some(op) = rest.chars().next() {
        rest = &rest[op.len_utf8()..];
        if op == '^' && rest.starts_with('{') {
            let close = rest.find('}').ok_or_else(bad)?;
            let target = match &rest[1..close] {
                "" => None,
                "object" => Some(PeelTarget::Object),
                kind => Some(PeelTarget::Kind(ObjectType::parse(kind).map_err(|_| bad())?)),
            };
            suffixes.push(Suffix::Peel(target));
            rest = &rest[close + 1..];
            continue;
        }

        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        let count = if digits == 0 {
            1
        } else {
            rest[..digits].parse::<usize>().map_err(|_| bad())?
        };
        rest = &rest[digits..];
        suffixes.push(match op {
            '~' => Suffix::Ancestor(count),
            '^' => Suffix::Parent(count),
            _ => return Err(bad()),
        });
    }
    Ok((base, suffixes))
}

/// Resolve the base of a revision to an object id
fn resolve_base(base: &str, refs: &RefDatabase, odb: &ObjectDatabase) -> GitResult<Oid> {
    if Oid::is_valid_hex(base) {
        return Oid::from_hex(base);
    }

    let name = if base == "@" { "HEAD" } else { base };
    for candidate in dwim_candidates(name) {
        if validate_name(&candidate).is_err() || !refs.exists(&candidate) {
            continue;
        }
        return match refs.follow(&candidate)? {
            (_, Some(id)) => {
                debug!(revision = %base, reference = %candidate, oid = %id, "resolved reference");
                Ok(id)
            }
            (last, None) => Err(GitError::ReferenceNotFound(last)),
        };
    }

    if Oid::is_valid_prefix(base) {
        return odb.find_by_prefix(base);
    }
    Err(GitError::ReferenceNotFound(base.to_string()))
}

/// Peel `id` until it is an object of `target`, or of any non-tag type
pub fn peel(odb: &ObjectDatabase, id: Oid, target: Option<ObjectType>) -> GitResult<Oid> {
    let mut current = id;
    loop {
        let object = odb.read_object(&current)?;
        let kind = object.kind();
        match target {
            Some(want) if want == kind => return Ok(current),
            None if kind != ObjectType::Tag => return Ok(current),
            _ => {}
        }
        current = match object.into_body() {
            ObjectBody::Tag(tag) => tag.target,
            ObjectBody::Commit(commit) if target == Some(ObjectType::Tree) => commit.tree,
            _ => {
                return Err(GitError::invalid_format(format!(
                    "{} ({}) cannot be peeled to {}",
                    id,
                    kind,
                    target.map_or("a non-tag object", |t| t.as_str())
                )))
            }
        };
    }
}

fn parents_of(odb: &ObjectDatabase, id: Oid) -> GitResult<Vec<Oid>> {
    let commit_id = peel(odb, id, Some(ObjectType::Commit))?;
    let object = odb.read_object(&commit_id)?;
    let kind = object.kind();
    object
        .into_commit()
        .map(|c| c.parents)
        .ok_or_else(|| GitError::invalid_format(format!("{} is a {}, not a commit", commit_id, kind)))
}

/// Resolve a revision to an object id
///
/// Fails with `ReferenceNotFound` or `ObjectNotFound` when nothing matches,
/// `Ambiguous` for a short id with several candidates and `InvalidFormat`
/// for malformed suffixes or impossible peels.
pub fn resolve_revision(spec: &str, refs: &RefDatabase, odb: &ObjectDatabase) -> GitResult<Oid> {
    let (base, suffixes) = parse(spec)?;
    let mut id = resolve_base(base, refs, odb)?;

    for suffix in suffixes {
        id = match suffix {
            Suffix::Ancestor(count) => {
                for generation in 0..count {
                    id = *parents_of(odb, id)?.first().ok_or_else(|| {
                        GitError::ObjectNotFound(format!(
                            "{}: {} has no parent at generation {}",
                            spec,
                            id,
                            generation + 1
                        ))
                    })?;
                }
                id
            }
            Suffix::Parent(0) => peel(odb, id, Some(ObjectType::Commit))?,
            Suffix::Parent(n) => *parents_of(odb, id)?.get(n - 1).ok_or_else(|| {
                GitError::ObjectNotFound(format!("{}: {} has no parent {}", spec, id, n))
            })?,
            Suffix::Peel(None) => peel(odb, id, None)?,
            Suffix::Peel(Some(PeelTarget::Object)) => {
                if !odb.exists(&id) {
                    return Err(GitError::ObjectNotFound(id.to_hex()));
                }
                id
            }
            Suffix::Peel(Some(PeelTarget::Kind(kind))) => peel(odb, id, Some(kind))?,
        };
    }
    debug!(revision = %spec, oid = %id, "resolved revision");
    Ok(id)
}
