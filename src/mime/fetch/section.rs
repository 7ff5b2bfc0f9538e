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

//! Extraction of `BODY[...]` sections.
//!
//! See the module documentation of `mime::fetch` for how section specifiers
//! map onto `LeafType`.

use std::borrow::Cow;
use std::fmt;

use mailparse::ParsedMail;

use crate::mime::{header, to_crlf};
use crate::support::error::Error;

/// Describes which portion of a part to process.
///
/// The semantics of the values match IMAP's, and as a result are wonky and
/// fraught with special cases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LeafType {
    /// Process the entire part, headers and all.
    Full,
    /// At top-level, process the headers.
    ///
    /// For others, process the headers of the embedded message. The part
    /// must be a `message/rfc822`.
    Headers,
    /// Process the headers of the part.
    Mime,
    /// Process the content of the part.
    Content,
    /// At top level, process the content of the part.
    ///
    /// For others, process the content of the embedded message. The part
    /// must be a `message/rfc822`.
    Text,
}

impl LeafType {
    fn acts_on_embedded(self, is_top_level: bool) -> bool {
        match self {
            Self::Full | Self::Mime | Self::Content => false,
            Self::Headers | Self::Text => !is_top_level,
        }
    }
}

/// Identifies a particular portion of the body to fetch.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct BodySection {
    /// Which subscripts to traverse to find the part in question.
    pub subscripts: Vec<u32>,
    /// Which subsection of the part to read.
    pub leaf_type: LeafType,
    /// Apply filtering to these header names.
    pub header_filter: Vec<String>,
    /// If true, discard headers matching `header_filter`.
    ///
    /// If false, keep only headers matching that filter.
    pub discard_matching_headers: bool,
    /// If set, slice the data produced by the above to this range, clamping
    /// each endpoint.
    pub partial: Option<(u64, u64)>,
    /// If set, report this section using the given legacy IMAP2 name (e.g.
    /// `RFC822.HEADER` instead of `BODY[HEADER]`).
    pub report_as_legacy: Option<Imap2Section>,
    /// Whether the client used `BODY.PEEK`.
    ///
    /// Reading never sets `\Seen` here, so this only records what the client
    /// asked for.
    pub peek: bool,
}

impl Default for BodySection {
    fn default() -> Self {
        BodySection {
            subscripts: vec![],
            leaf_type: LeafType::Full,
            header_filter: vec![],
            discard_matching_headers: false,
            partial: None,
            report_as_legacy: None,
            peek: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Imap2Section {
    Rfc822,
    Rfc822Header,
    Rfc822Text,
}

impl BodySection {
    /// Extract this section from the message in `data`.
    ///
    /// Returns `Ok(None)` if the section addresses a part that doesn't exist.
    /// The result always has CRLF line endings.
    pub fn fetch(&self, data: &[u8]) -> Result<Option<Vec<u8>>, Error> {
        let mut raw: Cow<[u8]> = Cow::Borrowed(data);
        let mut is_top_level = true;

        for &subscript in &self.subscripts {
            let next = {
                let parsed = mailparse::parse_mail(&raw)?;
                if !is_top_level && is_message_rfc822(&parsed) {
                    // Subscripting an embedded message implicitly traverses
                    // into it first.
                    let embedded = parsed.get_body_raw()?;
                    let inner = mailparse::parse_mail(&embedded)?;
                    subpart(&inner, subscript).map(<[u8]>::to_vec)
                } else {
                    subpart(&parsed, subscript).map(<[u8]>::to_vec)
                }
            };

            match next {
                Some(next) => raw = Cow::Owned(next),
                None => return Ok(None),
            }
            is_top_level = false;
        }

        if self.leaf_type.acts_on_embedded(is_top_level) {
            let embedded = {
                let parsed = mailparse::parse_mail(&raw)?;
                if !is_message_rfc822(&parsed) {
                    return Ok(None);
                }
                parsed.get_body_raw()?
            };
            raw = Cow::Owned(embedded);
        }

        let offset = header::body_offset(&raw)?;
        let (head, content) = raw.split_at(offset);
        let extracted: Cow<[u8]> = match self.leaf_type {
            LeafType::Full => Cow::Borrowed(&raw[..]),
            LeafType::Headers | LeafType::Mime
                if !self.header_filter.is_empty() =>
            {
                Cow::Owned(header::filter_headers(
                    head,
                    &self.header_filter,
                    self.discard_matching_headers,
                ))
            }
            LeafType::Headers | LeafType::Mime => Cow::Borrowed(head),
            LeafType::Content | LeafType::Text => Cow::Borrowed(content),
        };

        let mut extracted = to_crlf(&extracted).into_owned();
        if let Some((start, end)) = self.partial {
            let len = extracted.len() as u64;
            let start = start.min(len) as usize;
            let end = end.min(len).max(start as u64) as usize;
            extracted.truncate(end);
            extracted.drain(..start);
        }

        Ok(Some(extracted))
    }
}

fn is_message_rfc822(part: &ParsedMail<'_>) -> bool {
    part.ctype.mimetype.eq_ignore_ascii_case("message/rfc822")
}

/// Select part `subscript` (1-based) of `part`.
///
/// A non-multipart has exactly one part, itself.
fn subpart<'a>(part: &ParsedMail<'a>, subscript: u32) -> Option<&'a [u8]> {
    if !part.subparts.is_empty() {
        subscript
            .checked_sub(1)
            .and_then(|ix| part.subparts.get(ix as usize))
            .map(|p| p.raw_bytes)
    } else if 1 == subscript {
        Some(part.raw_bytes)
    } else {
        None
    }
}

/// Formats the section the way it is named in a `FETCH` response.
impl fmt::Display for BodySection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.report_as_legacy {
            Some(Imap2Section::Rfc822) => return write!(f, "RFC822"),
            Some(Imap2Section::Rfc822Header) => {
                return write!(f, "RFC822.HEADER")
            }
            Some(Imap2Section::Rfc822Text) => return write!(f, "RFC822.TEXT"),
            None => (),
        }

        write!(f, "BODY[")?;
        for (ix, subscript) in self.subscripts.iter().enumerate() {
            if 0 != ix {
                write!(f, ".")?;
            }
            write!(f, "{}", subscript)?;
        }

        let leaf = match self.leaf_type {
            LeafType::Full | LeafType::Content => "",
            LeafType::Headers if self.header_filter.is_empty() => "HEADER",
            LeafType::Headers if self.discard_matching_headers => {
                "HEADER.FIELDS.NOT"
            }
            LeafType::Headers => "HEADER.FIELDS",
            LeafType::Mime => "MIME",
            LeafType::Text => "TEXT",
        };

        if !leaf.is_empty() {
            if !self.subscripts.is_empty() {
                write!(f, ".")?;
            }
            write!(f, "{}", leaf)?;
        }

        if !self.header_filter.is_empty() {
            write!(f, " ({})", self.header_filter.join(" "))?;
        }

        write!(f, "]")?;
        if let Some((start, _)) = self.partial {
            write!(f, "<{}>", start)?;
        }

        Ok(())
    }
}
