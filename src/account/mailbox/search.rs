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

use std::convert::TryFrom;
use std::sync::Arc;

use log::{debug, warn};
use mailparse::{MailHeaderMap, ParsedMail};
use regex::{self, Regex};

use super::defs::*;
use super::search_backend::{self, Op, SearchData};
use crate::account::model::*;
use crate::mime::header;
use crate::support::error::Error;

/// The values `*` stands for in sequence sets within a search.
#[derive(Clone, Copy, Debug, Default)]
struct Splat {
    seqnum: u32,
    uid: u32,
}

impl Mailbox {
    /// The `SEARCH` command.
    pub fn seqnum_search(
        &mut self,
        queries: &[SearchQuery],
    ) -> Result<Vec<Seqnum>, Error> {
        Ok(self.search(queries)?.into_iter().map(|(s, _)| s).collect())
    }

    /// The `UID SEARCH` command.
    pub fn uid_search(
        &mut self,
        queries: &[SearchQuery],
    ) -> Result<Vec<Uid>, Error> {
        Ok(self.search(queries)?.into_iter().map(|(_, u)| u).collect())
    }

    /// Untyped entry point for `seqnum_search()` and `uid_search()`.
    ///
    /// Returns UIDs if `is_uid` is true and sequence numbers otherwise, in
    /// file order.
    pub fn search_messages(
        &mut self,
        is_uid: bool,
        queries: &[SearchQuery],
    ) -> Result<Vec<u32>, Error> {
        Ok(self
            .search(queries)?
            .into_iter()
            .map(|(s, u)| if is_uid { u32::from(u) } else { u32::from(s) })
            .collect())
    }

    /// Find every message with a usable UID which matches all of `queries`.
    ///
    /// Each message is evaluated in stages, each only loading more of the
    /// message if the previous one couldn't decide:
    ///
    /// 1. Only the sequence number and UID are known.
    /// 2. The flags are added.
    /// 3. The message is parsed and everything else is added.
    ///
    /// A message on which a predicate fails is logged and does not match.
    fn search(
        &mut self,
        queries: &[SearchQuery],
    ) -> Result<Vec<(Seqnum, Uid)>, Error> {
        let splat = if queries.iter().any(SearchQuery::has_star) {
            let census = census(&self.file)?;
            Splat {
                seqnum: u32::try_from(census.messages).unwrap_or(u32::MAX),
                uid: census.max_uid.map_or(0, u32::from),
            }
        } else {
            Splat::default()
        };

        let mut ops = Vec::new();
        compile_and(&mut ops, queries, splat)?;
        let wants_content = search_backend::wants_content(&ops);

        let mut hits = Vec::new();
        for item in scan(&self.file)? {
            let (seqnum, message) = match item {
                Ok(m) => m,
                Err(e) if e.is_per_message() => {
                    debug!("{} Skipping message: {}", self.log_prefix(), e);
                    continue;
                }
                Err(e) => return Err(e),
            };

            let uid = match message.uid() {
                Ok(uid) => uid,
                Err(e) => {
                    debug!(
                        "{} Skipping message {}: {}",
                        self.log_prefix(),
                        seqnum,
                        e
                    );
                    continue;
                }
            };

            match self.search_one(&ops, seqnum, uid, &message, wants_content) {
                Ok(true) => hits.push((seqnum, uid)),
                Ok(false) => (),
                Err(e) => {
                    warn!(
                        "{} Error evaluating UID {} for search: {}",
                        self.log_prefix(),
                        uid.0.get(),
                        e
                    );
                }
            }
        }

        Ok(hits)
    }

    fn search_one(
        &self,
        ops: &[Op],
        seqnum: Seqnum,
        uid: Uid,
        message: &Message,
        wants_content: bool,
    ) -> Result<bool, Error> {
        let mut data = SearchData {
            seqnum: Some(seqnum),
            uid: Some(uid),
            ..SearchData::default()
        };
        if let Some(result) = search_backend::eval(ops, &data)? {
            return Ok(result);
        }

        data.flags = Some(message.flags());
        if let Some(result) = search_backend::eval(ops, &data)? {
            return Ok(result);
        }

        let parsed = message.parse()?;
        data.size = Some(message.size(self.options.size_accounting));
        data.internal_date =
            Some(message.internal_date(self.options.internal_date));
        data.date = Some(match parsed.headers.get_first_value("Date") {
            None => Err("no Date header".to_owned()),
            Some(value) => header::parse_datetime(&value)
                .ok_or_else(|| format!("unparsable Date header {:?}", value)),
        });
        data.headers = Some(
            parsed
                .headers
                .iter()
                .map(|h| (h.get_key().to_ascii_lowercase(), h.get_value()))
                .collect(),
        );
        if wants_content {
            let mut content = String::new();
            collect_text(&parsed, &mut content);
            data.content = Some(content);
        }

        // Nothing is left unknown at this point, so this can only be None if
        // the query has a shape the stack machine can't handle.
        Ok(search_backend::eval(ops, &data)?.unwrap_or(false))
    }
}

/// Append the decoded text of every leaf part of `part` to `dst`.
fn collect_text(part: &ParsedMail<'_>, dst: &mut String) {
    if part.subparts.is_empty() {
        match part.get_body() {
            Ok(body) => dst.push_str(&body),
            Err(_) => {
                dst.push_str(&String::from_utf8_lossy(part.raw_bytes))
            }
        }
        dst.push('\n');
    } else {
        for subpart in &part.subparts {
            collect_text(subpart, dst);
        }
    }
}

fn compile_and(
    dst: &mut Vec<Op>,
    queries: &[SearchQuery],
    splat: Splat,
) -> Result<(), Error> {
    if queries.is_empty() {
        dst.push(Op::True);
        return Ok(());
    }

    let mut first = true;
    for q in queries {
        compile_one(dst, q, splat)?;
        if !first {
            dst.push(Op::And);
        }
        first = false;
    }

    Ok(())
}

fn compile_one(
    dst: &mut Vec<Op>,
    query: &SearchQuery,
    splat: Splat,
) -> Result<(), Error> {
    match *query {
        SearchQuery::SequenceSet(ref seqnums) => {
            dst.push(Op::SeqnumIn(seqnums.resolve(splat.seqnum)));
        }

        SearchQuery::UidSet(ref uids) => {
            dst.push(Op::UidIn(uids.resolve(splat.uid)));
        }

        SearchQuery::All => dst.push(Op::True),

        SearchQuery::Answered => dst.push(Op::Flag(Flag::Answered)),

        SearchQuery::Bcc(ref pat) => header_op(dst, "bcc", pat)?,

        SearchQuery::Before(date) => {
            dst.push(Op::InternalDateCompare(date, true, false, false));
        }

        SearchQuery::Body(ref pat) => {
            dst.push(Op::Content(Arc::new(to_regex(pat)?)));
        }

        SearchQuery::Cc(ref pat) => header_op(dst, "cc", pat)?,

        SearchQuery::Deleted => dst.push(Op::Flag(Flag::Deleted)),

        SearchQuery::Draft => dst.push(Op::Flag(Flag::Draft)),

        SearchQuery::Flagged => dst.push(Op::Flag(Flag::Flagged)),

        SearchQuery::From(ref pat) => header_op(dst, "from", pat)?,

        SearchQuery::Header(ref name, ref value) => {
            header_op(dst, name, value)?
        }

        // Keywords are never stored, so this matches nothing once the flags
        // are known.
        SearchQuery::Keyword(ref name) => {
            dst.push(Op::Flag(Flag::Keyword(name.to_owned())));
        }

        SearchQuery::Larger(thresh) => {
            dst.push(Op::SizeCompare(thresh, false, false, true));
        }

        // There is no \Recent state in an mbox store; nothing is recent, so
        // nothing is new, and everything is old.
        SearchQuery::Recent | SearchQuery::New => dst.push(Op::False),
        SearchQuery::Old => dst.push(Op::True),

        SearchQuery::Not(ref sub) => {
            compile_one(dst, sub, splat)?;
            dst.push(Op::Not);
        }

        SearchQuery::On(date) => {
            dst.push(Op::InternalDateCompare(date, false, true, false));
        }

        SearchQuery::Or(ref a, ref b) => {
            compile_one(dst, a, splat)?;
            compile_one(dst, b, splat)?;
            dst.push(Op::Or);
        }

        SearchQuery::Seen => dst.push(Op::Flag(Flag::Seen)),

        SearchQuery::SentBefore(date) => {
            dst.push(Op::DateCompare(date, true, false, false));
        }

        SearchQuery::SentOn(date) => {
            dst.push(Op::DateCompare(date, false, true, false));
        }

        SearchQuery::SentSince(date) => {
            // RFC 3501 specifies >=, not >
            dst.push(Op::DateCompare(date, false, true, true));
        }

        SearchQuery::Since(date) => {
            // RFC 3501 specifies >=, not >
            dst.push(Op::InternalDateCompare(date, false, true, true));
        }

        SearchQuery::Smaller(thresh) => {
            dst.push(Op::SizeCompare(thresh, true, false, false));
        }

        SearchQuery::Subject(ref pat) => header_op(dst, "subject", pat)?,

        SearchQuery::Text(ref pat) => {
            let regex = Arc::new(to_regex(pat)?);
            dst.push(Op::AnyHeader(Arc::clone(&regex)));
            dst.push(Op::Content(regex));
            dst.push(Op::Or);
        }

        SearchQuery::To(ref pat) => header_op(dst, "to", pat)?,

        SearchQuery::Unanswered => {
            dst.push(Op::Flag(Flag::Answered));
            dst.push(Op::Not);
        }

        SearchQuery::Undeleted => {
            dst.push(Op::Flag(Flag::Deleted));
            dst.push(Op::Not);
        }

        SearchQuery::Undraft => {
            dst.push(Op::Flag(Flag::Draft));
            dst.push(Op::Not);
        }

        SearchQuery::Unflagged => {
            dst.push(Op::Flag(Flag::Flagged));
            dst.push(Op::Not);
        }

        SearchQuery::Unkeyword(ref name) => {
            dst.push(Op::Flag(Flag::Keyword(name.to_owned())));
            dst.push(Op::Not);
        }

        SearchQuery::Unseen => {
            dst.push(Op::Flag(Flag::Seen));
            dst.push(Op::Not);
        }

        SearchQuery::And(ref queries) => compile_and(dst, queries, splat)?,
    }

    Ok(())
}

fn header_op(dst: &mut Vec<Op>, name: &str, pat: &str) -> Result<(), Error> {
    dst.push(Op::Header(name.to_ascii_lowercase(), to_regex(pat)?));
    Ok(())
}

/// Build a case-insensitive substring matcher for `pat`, in which any run of
/// whitespace matches any other run of whitespace.
fn to_regex(pat: &str) -> Result<Regex, Error> {
    let mut regex_str = String::new();
    for (ix, chunk) in pat.split_whitespace().enumerate() {
        if 0 != ix {
            regex_str.push_str("[ \r\n\t]+");
        }
        regex_str.push_str(&regex::escape(chunk));
    }

    regex::RegexBuilder::new(&regex_str)
        .case_insensitive(true)
        .build()
        .map_err(|e| Error::BadSearchQuery(e.to_string()))
}
