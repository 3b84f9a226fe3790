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

//! Annotated tag objects

use crate::error::{GitError, GitResult};
use crate::headers;
use crate::object::ObjectType;
use crate::oid::Oid;
use crate::signature::Signature;

/// Annotated tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Tagged object
    pub target: Oid,
    /// Type of the tagged object
    pub target_type: ObjectType,
    /// Short tag name, e.g. `v1.0`
    pub name: String,
    /// Who tagged; very old tags have none
    pub tagger: Option<Signature>,
    /// Headers after `tagger`, such as `gpgsig`
    pub extra_headers: Vec<(String, String)>,
    /// Message, exactly as stored
    pub message: String,
}

impl Tag {
    /// Create a tag
    pub fn new(
        target: Oid,
        target_type: ObjectType,
        name: impl Into<String>,
        tagger: Signature,
        message: impl Into<String>,
    ) -> Self {
        Tag {
            target,
            target_type,
            name: name.into(),
            tagger: Some(tagger),
            extra_headers: Vec::new(),
            message: message.into(),
        }
    }

    /// Parse a tag payload
    pub fn parse(data: &[u8]) -> GitResult<Self> {
        let block = headers::parse(data, "tag")?;

        let mut target = None;
        let mut target_type = None;
        let mut name = None;
        let mut tagger = None;
        let mut extra_headers = Vec::new();

        for (key, value) in block.fields {
            match key.as_str() {
                "object" if target.is_none() => target = Some(Oid::from_hex(&value)?),
                "type" if target_type.is_none() => target_type = Some(ObjectType::parse(&value)?),
                "tag" if name.is_none() => name = Some(value),
                "tagger" if tagger.is_none() => tagger = Some(Signature::parse(&value)?),
                _ => extra_headers.push((key, value)),
            }
        }

        let missing = |field: &str| GitError::invalid_format(format!("tag has no {}", field));
        Ok(Tag {
            target: target.ok_or_else(|| missing("object"))?,
            target_type: target_type.ok_or_else(|| missing("type"))?,
            name: name.ok_or_else(|| missing("tag name"))?,
            tagger,
            extra_headers,
            message: block.message,
        })
    }

    /// Canonical bytes
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(160 + self.message.len());
        headers::write_field(&mut out, "object", &self.target.to_hex());
        headers::write_field(&mut out, "type", self.target_type.as_str());
        headers::write_field(&mut out, "tag", &self.name);
        if let Some(tagger) = &self.tagger {
            headers::write_field(&mut out, "tagger", &tagger.to_git_string());
        }
        for (key, value) in &self.extra_headers {
            headers::write_field(&mut out, key, value);
        }
        out.push(b'\n');
        out.extend_from_slice(self.message.as_bytes());
        out
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SIMPLE: &[u8] = b"object e90810b8df3e80c413d903f631643c716887138d\n\
type commit\n\
tag e90810b\n\
tagger Vicent Marti <tanoku@gmail.com> 1281578357 +0200\n\
\n\
This is a very simple tag.\n";

    #[test]
    fn test_parse_known_tag() {
        let tag = Tag::parse(SIMPLE).unwrap();
        assert_eq!(tag.target.to_hex(), "e90810b8df3e80c413d903f631643c716887138d");
        assert_eq!(tag.target_type, ObjectType::Commit);
        assert_eq!(tag.name, "e90810b");
        let tagger = tag.tagger.as_ref().unwrap();
        assert_eq!(tagger.name(), "Vicent Marti");
        assert_eq!(tagger.offset_minutes(), 120);
        assert_eq!(tag.message, "This is a very simple tag.\n");
    }

    #[test]
    fn test_serialize_matches_git_id() {
        let tag = Tag::parse(SIMPLE).unwrap();
        assert_eq!(tag.serialize(), SIMPLE);
        assert_eq!(
            Oid::hash_object(ObjectType::Tag, &tag.serialize()).to_hex(),
            "7b4384978d2493e851f9cca7858815fac9b10980"
        );
    }

    #[test]
    fn test_tag_without_tagger() {
        let data = b"object e90810b8df3e80c413d903f631643c716887138d\ntype commit\ntag old\n\nancient\n";
        let tag = Tag::parse(data).unwrap();
        assert!(tag.tagger.is_none());
        assert_eq!(tag.serialize(), data.to_vec());
    }

    #[test]
    fn test_missing_type_rejected() {
        let data = b"object e90810b8df3e80c413d903f631643c716887138d\ntag x\n\nm\n";
        assert!(Tag::parse(data).is_err());
    }
}
