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

//! Author/committer/tagger identities and Git timestamps
//!
//! Git records a time as seconds since the Unix epoch plus the author's
//! UTC offset in minutes, e.g. `1250379778 -0330`. The helpers here map
//! that pair to a `DateTime<FixedOffset>` and back without loss.

use crate::error::{GitError, GitResult};
use chrono::{DateTime, FixedOffset, Local, Offset, TimeZone, Utc};
use std::fmt;

/// Offsets must stay strictly within a day either side of UTC
const MAX_OFFSET_MINUTES: i32 = 24 * 60;

/// Moment in time as Git stores it: epoch seconds shown at an offset
pub fn to_date_time_offset(seconds: i64, offset_minutes: i32) -> GitResult<DateTime<FixedOffset>> {
    if offset_minutes.abs() >= MAX_OFFSET_MINUTES {
        return Err(GitError::invalid_format(format!(
            "timezone offset out of range: {} minutes",
            offset_minutes
        )));
    }
    let offset = FixedOffset::east_opt(offset_minutes * 60)
        .ok_or_else(|| GitError::invalid_format("invalid timezone offset"))?;
    offset
        .timestamp_opt(seconds, 0)
        .single()
        .ok_or_else(|| GitError::invalid_format(format!("timestamp out of range: {}", seconds)))
}

/// Epoch seconds of `when`
pub fn to_seconds_since_epoch(when: &DateTime<FixedOffset>) -> i64 {
    when.timestamp()
}

/// UTC offset of `when` in minutes
pub fn offset_minutes(when: &DateTime<FixedOffset>) -> i32 {
    when.offset().local_minus_utc() / 60
}

/// `+HHMM` / `-HHMM`
fn format_offset(minutes: i32) -> String {
    let sign = if minutes < 0 { '-' } else { '+' };
    let minutes = minutes.abs();
    format!("{}{:02}{:02}", sign, minutes / 60, minutes % 60)
}

fn parse_offset(s: &str) -> GitResult<i32> {
    let bad = || GitError::invalid_format(format!("malformed timezone offset: {:?}", s));
    let (sign, digits) = match s.as_bytes().first() {
        Some(b'+') => (1, &s[1..]),
        Some(b'-') => (-1, &s[1..]),
        _ => return Err(bad()),
    };
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(bad());
    }
    let hours: i32 = digits[..2].parse().map_err(|_| bad())?;
    let minutes: i32 = digits[2..].parse().map_err(|_| bad())?;
    if minutes >= 60 {
        return Err(bad());
    }
    Ok(sign * (hours * 60 + minutes))
}

/// Name, email and time of an action
#[derive(Clone)]
pub struct Signature {
    name: String,
    email: String,
    when: DateTime<FixedOffset>,
}

impl Signature {
    /// Build a signature
    ///
    /// Name and email must be non-empty and free of `<`, `>`, NUL and
    /// newlines. The offset of `when` must be a whole number of minutes.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        when: DateTime<FixedOffset>,
    ) -> GitResult<Self> {
        let name = name.into();
        let email = email.into();
        check_identity_part("name", &name)?;
        check_identity_part("email", &email)?;
        let offset_seconds = when.offset().local_minus_utc();
        if offset_seconds % 60 != 0 {
            return Err(GitError::invalid_format(format!(
                "timezone offset of {} seconds is not whole minutes",
                offset_seconds
            )));
        }
        Ok(Signature { name, email, when })
    }

    /// Build a signature from Git's epoch seconds and offset minutes
    pub fn from_epoch(
        name: impl Into<String>,
        email: impl Into<String>,
        seconds: i64,
        offset_minutes: i32,
    ) -> GitResult<Self> {
        Self::new(name, email, to_date_time_offset(seconds, offset_minutes)?)
    }

    /// Signature stamped with the current local time
    pub fn now(name: impl Into<String>, email: impl Into<String>) -> GitResult<Self> {
        let local = Local::now();
        let offset = local.offset().fix();
        let when = Utc::now().with_timezone(&offset);
        // Sub-second precision isn't representable in Git.
        let when = to_date_time_offset(when.timestamp(), offset.local_minus_utc() / 60)?;
        Self::new(name, email, when)
    }

    /// Parse `Name <email> 1273360386 -0700`
    pub fn parse(line: &str) -> GitResult<Self> {
        let bad = |why: &str| GitError::invalid_format(format!("{}: {:?}", why, line));

        let open = line.find('<').ok_or_else(|| bad("signature has no '<'"))?;
        let close = line[open..]
            .find('>')
            .map(|i| open + i)
            .ok_or_else(|| bad("signature has no '>'"))?;

        let name = line[..open].trim_end();
        let email = &line[open + 1..close];

        let mut when = line[close + 1..].split_whitespace();
        let seconds: i64 = when
            .next()
            .ok_or_else(|| bad("signature has no timestamp"))?
            .parse()
            .map_err(|_| bad("signature timestamp is not a number"))?;
        let offset = parse_offset(when.next().ok_or_else(|| bad("signature has no offset"))?)?;
        if when.next().is_some() {
            return Err(bad("trailing data after signature"));
        }

        // Git tolerates an empty name on read.
        let when = to_date_time_offset(seconds, offset)?;
        Ok(Signature {
            name: name.to_string(),
            email: email.to_string(),
            when,
        })
    }

    /// Name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Email, without angle brackets
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Time, at the signer's offset
    pub fn when(&self) -> DateTime<FixedOffset> {
        self.when
    }

    /// Epoch seconds
    pub fn seconds(&self) -> i64 {
        to_seconds_since_epoch(&self.when)
    }

    /// Offset from UTC in minutes
    pub fn offset_minutes(&self) -> i32 {
        offset_minutes(&self.when)
    }

    /// Form used inside commit and tag objects
    pub fn to_git_string(&self) -> String {
        format!(
            "{} <{}> {} {}",
            self.name,
            self.email,
            self.seconds(),
            format_offset(self.offset_minutes())
        )
    }
}

fn check_identity_part(field: &str, value: &str) -> GitResult<()> {
    if value.is_empty() {
        return Err(GitError::invalid_format(format!("signature {} is empty", field)));
    }
    if value.chars().any(|c| matches!(c, '<' | '>' | '\0' | '\n')) {
        return Err(GitError::invalid_format(format!(
            "signature {} contains '<', '>', NUL or newline: {:?}",
            field, value
        )));
    }
    Ok(())
}

// Two signatures at the same instant but different offsets differ.
impl PartialEq for Signature {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.email == other.email
            && self.seconds() == other.seconds()
            && self.offset_minutes() == other.offset_minutes()
    }
}

impl Eq for Signature {}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_git_string())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signature")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("when", &self.when.to_rfc2822())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn rfc2822(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc2822(s).unwrap()
    }

    #[test]
    fn test_epoch_to_date() {
        let cases = [
            (1291801952, 0, "Wed, 08 Dec 2010 09:52:32 GMT"),
            (1234567890, 0, "Fri, 13 Feb 2009 23:31:30 GMT"),
            (1234567890, 60, "Sat, 14 Feb 2009 00:31:30 +0100"),
            (1288114383, 0, "Tue, 26 Oct 2010 17:33:03 GMT"),
            (1250379778, -210, "Sat, 15 Aug 2009 20:12:58 -0330"),
            (1250379778, 0, "Sat, 15 Aug 2009 23:42:58 GMT"),
            (1250379778, 60, "Sun, 16 Aug 2009 00:42:58 +0100"),
        ];
        for (seconds, offset, expected) in cases {
            let date = to_date_time_offset(seconds, offset).unwrap();
            let expected = rfc2822(expected);
            assert_eq!(date, expected);
            assert_eq!(offset_minutes(&date), offset_minutes(&expected));
        }
    }

    #[test]
    fn test_date_to_epoch() {
        let date = rfc2822("Sat, 15 Aug 2009 20:12:58 -0330");
        assert_eq!(to_seconds_since_epoch(&date), 1250379778);
        assert_eq!(offset_minutes(&date), -210);
        assert_eq!(date.to_rfc2822(), "Sat, 15 Aug 2009 20:12:58 -0330");
    }

    #[test]
    fn test_offset_bounds() {
        assert!(to_date_time_offset(0, 1439).is_ok());
        assert!(to_date_time_offset(0, -1439).is_ok());
        assert!(to_date_time_offset(0, 1440).is_err());
        assert!(to_date_time_offset(0, -1440).is_err());
    }

    #[test]
    fn test_parse_and_format() {
        let line = "Scott Chacon <schacon@gmail.com> 1273360386 -0700";
        let sig = Signature::parse(line).unwrap();
        assert_eq!(sig.name(), "Scott Chacon");
        assert_eq!(sig.email(), "schacon@gmail.com");
        assert_eq!(sig.seconds(), 1273360386);
        assert_eq!(sig.offset_minutes(), -420);
        assert_eq!(sig.to_git_string(), line);
    }

    #[test]
    fn test_half_hour_offset_formatting() {
        let sig = Signature::from_epoch("A", "a@b.c", 1250379778, -210).unwrap();
        assert!(sig.to_git_string().ends_with(" 1250379778 -0330"));
        let sig = Signature::from_epoch("A", "a@b.c", 1250379778, 345).unwrap();
        assert!(sig.to_git_string().ends_with(" +0545"));
    }

    #[test]
    fn test_malformed_lines_rejected() {
        for bad in [
            "No Email 1273360386 -0700",
            "Name <email 1273360386 -0700",
            "Name <e@x> notanumber -0700",
            "Name <e@x> 1273360386",
            "Name <e@x> 1273360386 0700",
            "Name <e@x> 1273360386 -07:00",
            "Name <e@x> 1273360386 -0760",
            "Name <e@x> 1273360386 -0700 extra",
        ] {
            assert!(Signature::parse(bad).is_err(), "{:?}", bad);
        }
    }

    #[test]
    fn test_new_validates_identity() {
        let when = to_date_time_offset(0, 0).unwrap();
        assert!(Signature::new("", "me@there.com", when).is_err());
        assert!(Signature::new("Me", "", when).is_err());
        assert!(Signature::new("Me", "\0", when).is_err());
        assert!(Signature::new("Me", "a\0b", when).is_err());
        assert!(Signature::new("M<e", "me@there.com", when).is_err());
        assert!(Signature::new("Me", "me@there.com", when).is_ok());
    }

    #[test]
    fn test_new_rejects_sub_minute_offsets() {
        for seconds in [30, -1, 19800 + 59] {
            let offset = FixedOffset::east_opt(seconds).unwrap();
            let when = offset.timestamp_opt(1250379778, 0).unwrap();
            assert!(matches!(
                Signature::new("Me", "me@there.com", when),
                Err(GitError::InvalidFormat(_))
            ));
        }

        let ist = FixedOffset::east_opt(19800).unwrap();
        let when = ist.timestamp_opt(1250379778, 0).unwrap();
        let sig = Signature::new("Me", "me@there.com", when).unwrap();
        assert_eq!(sig.offset_minutes(), 330);
        assert_eq!(sig.when(), when);
    }

    #[test]
    fn test_equality_includes_offset() {
        let a = Signature::from_epoch("A", "a@b.c", 1250379778, 0).unwrap();
        let b = Signature::from_epoch("A", "a@b.c", 1250379778, 60).unwrap();
        assert_eq!(a.when(), b.when());
        assert_ne!(a, b);
        assert_eq!(a.clone(), a);
    }

    #[test]
    fn test_now_has_whole_seconds() {
        let sig = Signature::now("A", "a@b.c").unwrap();
        assert_eq!(sig.when().timestamp_subsec_nanos(), 0);
    }
}
