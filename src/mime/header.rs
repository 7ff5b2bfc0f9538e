//-
// Copyright (c) 2020, Jason Lingle
//
// This file is part of Mboxmap.
//
// Mboxmap is free software: you can  redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free
// Software Foundation, either version  3 of the License, or (at  your option)
// any later version.
//
// Mboxmap is distributed  in the hope that  it will be useful,  but WITHOUT
// ANY WARRANTY; without  even the implied  warranty of MERCHANTABILITY  or
// FITNESS FOR  A PARTICULAR  PURPOSE.  See the  GNU General  Public  License
// for more details.
//
// You should have received a copy of the GNU General Public License along with
// Mboxmap. If not, see <http://www.gnu.org/licenses/>.

//! Utilities for working with individual RFC 5322 headers.
//!
//! Parsing is left to `mailparse`; this module adds the pieces it lacks,
//! chiefly editing the header block of a message in place.

use chrono::prelude::*;

use crate::support::error::Error;

/// Return the offset at which the body of `data` starts, i.e., just past the
/// blank line terminating the headers.
pub fn body_offset(data: &[u8]) -> Result<usize, Error> {
    let (_, offset) = mailparse::parse_headers(data)?;
    Ok(offset)
}

/// Replace every instance of the header `name` in `data` with a single
/// `name: value` field, placed at the end of the header block.
pub fn set_header(
    data: &[u8],
    name: &str,
    value: &str,
) -> Result<Vec<u8>, Error> {
    edit_header(data, name, Some(value))
}

/// Remove every instance of the header `name` from `data`.
pub fn remove_header(data: &[u8], name: &str) -> Result<Vec<u8>, Error> {
    edit_header(data, name, None)
}

fn edit_header(
    data: &[u8],
    name: &str,
    value: Option<&str>,
) -> Result<Vec<u8>, Error> {
    let offset = body_offset(data)?;
    let (head, body) = data.split_at(offset);
    let eol: &[u8] = if memchr::memmem::find(head, b"\r\n").is_some() {
        b"\r\n"
    } else {
        b"\n"
    };

    let mut out = Vec::with_capacity(data.len() + name.len() + 16);
    let mut terminator: &[u8] = &[];
    let mut dropping = false;
    for line in head.split_inclusive(|&b| b'\n' == b) {
        if b"\n" == line || b"\r\n" == line {
            terminator = line;
            break;
        }

        let continuation = line.starts_with(b" ") || line.starts_with(b"\t");
        if !continuation {
            dropping = is_field(line, name);
        }

        if !dropping {
            out.extend_from_slice(line);
        }
    }

    if let Some(value) = value {
        if !out.is_empty() && !out.ends_with(b"\n") {
            out.extend_from_slice(eol);
        }
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(b": ");
        out.extend_from_slice(value.as_bytes());
        out.extend_from_slice(eol);
    }

    out.extend_from_slice(terminator);
    out.extend_from_slice(body);
    Ok(out)
}

fn is_field(line: &[u8], name: &str) -> bool {
    line.len() > name.len()
        && line[..name.len()].eq_ignore_ascii_case(name.as_bytes())
        && line[name.len()..]
            .iter()
            .copied()
            .find(|&b| b' ' != b && b'\t' != b)
            == Some(b':')
}

/// Filter the header block `head` to the fields named in `names`.
///
/// If `discard` is true, the named fields are removed instead. Folded
/// continuation lines go with their field. The terminating blank line, if
/// present, is always kept.
pub fn filter_headers(
    head: &[u8],
    names: &[String],
    discard: bool,
) -> Vec<u8> {
    let mut out = Vec::with_capacity(head.len());
    let mut keeping = false;
    for line in head.split_inclusive(|&b| b'\n' == b) {
        if b"\n" == line || b"\r\n" == line {
            out.extend_from_slice(line);
            break;
        }

        if !line.starts_with(b" ") && !line.starts_with(b"\t") {
            keeping = discard != names.iter().any(|n| is_field(line, n));
        }

        if keeping {
            out.extend_from_slice(line);
        }
    }
    out
}

/// Parse an RFC 5322 date-time, keeping its zone offset where possible.
///
/// Dates that `chrono` can't handle are retried through `mailparse`'s more
/// forgiving parser, in which case the result is in UTC.
///
/// `mailparse` reports text it can't make sense of as timestamp 0, so that
/// result is treated as a failure; a genuine epoch date is always caught by
/// `chrono` first.
pub fn parse_datetime(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    DateTime::parse_from_rfc2822(value).ok().or_else(|| {
        if !value.bytes().any(|b| b.is_ascii_digit()) {
            return None;
        }

        mailparse::dateparse(value)
            .ok()
            .filter(|&ts| 0 != ts)
            .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
            .map(|dt| dt.with_timezone(&FixedOffset::east(0)))
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn set_header_replaces_all_instances() {
        let edited = set_header(
            b"X-Status: A\nSubject: hi\nx-status: F\n  continued\n\n\
              X-Status: body\n",
            "X-Status",
            "RD",
        )
        .unwrap();
        assert_eq!(
            "Subject: hi\nX-Status: RD\n\nX-Status: body\n",
            String::from_utf8(edited).unwrap()
        );
    }

    #[test]
    fn set_header_keeps_line_endings() {
        let edited =
            set_header(b"Subject: hi\r\n\r\nbody\r\n", "X-UID", "3").unwrap();
        assert_eq!(
            "Subject: hi\r\nX-UID: 3\r\n\r\nbody\r\n",
            String::from_utf8(edited).unwrap()
        );
    }

    #[test]
    fn set_header_without_body() {
        let edited = set_header(b"Subject: hi", "X-UID", "3").unwrap();
        assert_eq!(
            "Subject: hi\nX-UID: 3\n",
            String::from_utf8(edited).unwrap()
        );
    }

    #[test]
    fn remove_header_ignores_prefixes() {
        let edited = remove_header(
            b"X-UID: 1\nX-UIDL: abc\nSubject: hi\n\nbody\n",
            "X-UID",
        )
        .unwrap();
        assert_eq!(
            "X-UIDL: abc\nSubject: hi\n\nbody\n",
            String::from_utf8(edited).unwrap()
        );
    }

    #[test]
    fn filter_header_fields() {
        let head = b"Subject: hi\nTo: a@b.c,\n  d@e.f\nFrom: x@y.z\n\n";
        let names = vec!["to".to_owned(), "FROM".to_owned()];
        assert_eq!(
            "To: a@b.c,\n  d@e.f\nFrom: x@y.z\n\n",
            String::from_utf8(filter_headers(head, &names, false)).unwrap()
        );
        assert_eq!(
            "Subject: hi\n\n",
            String::from_utf8(filter_headers(head, &names, true)).unwrap()
        );
    }

    #[test]
    fn parse_dates() {
        assert_eq!(
            FixedOffset::west(7 * 3600)
                .ymd(2001, 5, 14)
                .and_hms(19, 36, 0),
            parse_datetime("Mon, 14 May 2001 19:36:00 -0700").unwrap()
        );
        assert_eq!(
            Utc.ymd(2001, 5, 15).and_hms(2, 36, 0),
            parse_datetime(" Mon, 14 May 2001 19:36:00 -0700 (PDT)")
                .unwrap()
                .with_timezone(&Utc)
        );
    }

    #[test]
    fn reject_unparsable_dates() {
        assert_eq!(None, parse_datetime("not a date"));
        assert_eq!(None, parse_datetime("yesterday"));
        assert_eq!(None, parse_datetime(""));
        assert_eq!(
            0,
            parse_datetime("Thu, 01 Jan 1970 00:00:00 +0000")
                .unwrap()
                .timestamp()
        );
    }
}
