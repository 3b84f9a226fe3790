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

//! Header block shared by commit and tag objects
//!
//! `key value\n` lines, where a line starting with a space continues the
//! previous value, then a blank line, then the free-form message.

use crate::error::{GitError, GitResult};

/// Parsed header lines and the message after the blank separator
pub(crate) struct HeaderBlock {
    pub fields: Vec<(String, String)>,
    pub message: String,
}

pub(crate) fn parse(data: &[u8], what: &str) -> GitResult<HeaderBlock> {
    let (head, message) = match find_blank_line(data) {
        Some(at) => (&data[..at], &data[at + 2..]),
        // Header-only objects: the last header line ends the data.
        None => (data, &data[data.len()..]),
    };
    // Legacy encodings (Latin-1 author names) decode with replacement characters.
    let head = String::from_utf8_lossy(head);

    let mut fields: Vec<(String, String)> = Vec::new();
    for line in head.split('\n').filter(|l| !l.is_empty()) {
        if let Some(continuation) = line.strip_prefix(' ') {
            let (_, value) = fields.last_mut().ok_or_else(|| {
                GitError::invalid_format(format!("{} starts with a continuation line", what))
            })?;
            value.push('\n');
            value.push_str(continuation);
            continue;
        }
        let (key, value) = line.split_once(' ').ok_or_else(|| {
            GitError::invalid_format(format!("malformed {} header line: {:?}", what, line))
        })?;
        fields.push((key.to_string(), value.to_string()));
    }

    Ok(HeaderBlock {
        fields,
        message: String::from_utf8_lossy(message).into_owned(),
    })
}

fn find_blank_line(data: &[u8]) -> Option<usize> {
    if data.first() == Some(&b'\n') {
        return None;
    }
    data.windows(2).position(|w| w == b"\n\n")
}

/// Append `key value\n`, continuing multi-line values with a leading space
pub(crate) fn write_field(out: &mut Vec<u8>, key: &str, value: &str) {
    out.extend_from_slice(key.as_bytes());
    out.push(b' ');
    let mut lines = value.split('\n');
    if let Some(first) = lines.next() {
        out.extend_from_slice(first.as_bytes());
    }
    for line in lines {
        out.extend_from_slice(b"\n ");
        out.extend_from_slice(line.as_bytes());
    }
    out.push(b'\n');
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_continuation_lines_fold_into_value() {
        let data = b"tree abc\ngpgsig -----BEGIN-----\n line two\n -----END-----\n\nmsg\n";
        let block = parse(data, "commit").unwrap();
        assert_eq!(block.fields.len(), 2);
        assert_eq!(block.fields[1].1, "-----BEGIN-----\nline two\n-----END-----");
        assert_eq!(block.message, "msg\n");

        let mut out = Vec::new();
        for (k, v) in &block.fields {
            write_field(&mut out, k, v);
        }
        out.push(b'\n');
        out.extend_from_slice(block.message.as_bytes());
        assert_eq!(out, data.to_vec());
    }

    #[test]
    fn test_leading_continuation_rejected() {
        assert!(parse(b" orphan\n\nmsg", "tag").is_err());
    }

    #[test]
    fn test_non_utf8_values_decode_lossily() {
        let block = parse(b"author Ren\xe9 <r@example.com> 0 +0000\n\nmsg\n", "commit").unwrap();
        assert_eq!(block.fields[0].1, "Ren\u{fffd} <r@example.com> 0 +0000");
    }

    #[test]
    fn test_missing_message() {
        let block = parse(b"tree abc\n", "commit").unwrap();
        assert_eq!(block.fields.len(), 1);
        assert!(block.message.is_empty());
    }
}
