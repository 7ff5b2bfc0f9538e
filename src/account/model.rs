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

use std::collections::BTreeMap;
use std::convert::TryFrom;
use std::fmt;
use std::marker::PhantomData;
use std::num::NonZeroU32;
use std::ops::Bound::{Excluded, Included, Unbounded};
use std::str::FromStr;

use chrono::prelude::*;

use crate::mime::fetch::section::BodySection;
use crate::support::error::Error;

/// The UID validity of every mbox mailbox.
///
/// An mbox file carries no record of being recreated, so there is nothing to
/// derive a real epoch from.
pub const UID_VALIDITY: u32 = 1;

/// Identifies a message within a single mailbox.
///
/// The UID lives in the `X-UID` header of the message. UIDs are assigned in
/// ascending order as messages are appended, but since the store is a plain
/// file that other programs may edit, nothing guarantees that every message
/// has one or that they are distinct.
///
/// 0 is not a valid UID; a message claiming UID 0 is treated the same as one
/// with no UID at all.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Uid(pub NonZeroU32);

impl fmt::Debug for Uid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Uid({})", self.0.get())
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.get())
    }
}

// This isn't a useful default implementation, but is here so that things
// containing SeqRange<ID> can still derive Default.
impl Default for Uid {
    fn default() -> Self {
        Uid::MIN
    }
}

impl Uid {
    // Unsafe because new() can't be unwrapped in a const context
    pub const MIN: Self = unsafe { Uid(NonZeroU32::new_unchecked(1)) };
    pub const MAX: Self = unsafe { Uid(NonZeroU32::new_unchecked(u32::MAX)) };

    pub fn of(uid: u32) -> Option<Self> {
        NonZeroU32::new(uid).map(Uid)
    }

    pub fn next(self) -> Option<Self> {
        self.0.get().checked_add(1).and_then(Uid::of)
    }

    pub fn saturating_next(self) -> Self {
        self.next().unwrap_or(Uid::MAX)
    }

    #[cfg(test)]
    pub fn u(uid: u32) -> Self {
        Uid::of(uid).unwrap()
    }
}

impl TryFrom<u32> for Uid {
    type Error = ();

    fn try_from(v: u32) -> Result<Self, ()> {
        Self::of(v).ok_or(())
    }
}

impl From<Uid> for u32 {
    fn from(uid: Uid) -> u32 {
        uid.0.get()
    }
}

/// The position of a message in file order, starting at 1.
///
/// Sequence numbers are recomputed by every scan of the store and count every
/// record, whether or not it has a usable UID. An expunge renumbers every
/// message after the first one removed.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Seqnum(pub NonZeroU32);

// This isn't a useful default implementation, but is here so that things
// containing SeqRange<ID> can still derive Default.
impl Default for Seqnum {
    fn default() -> Self {
        Seqnum::MIN
    }
}

impl Seqnum {
    // Unsafe because new() can't be unwrapped in a const context
    pub const MIN: Self = unsafe { Seqnum(NonZeroU32::new_unchecked(1)) };
    pub const MAX: Self =
        unsafe { Seqnum(NonZeroU32::new_unchecked(u32::MAX)) };

    pub fn of(seqnum: u32) -> Option<Self> {
        NonZeroU32::new(seqnum).map(Seqnum)
    }

    #[cfg(test)]
    pub fn u(seqnum: u32) -> Self {
        Seqnum::of(seqnum).unwrap()
    }

    /// Returns the sequence number following this one, saturating at `MAX`.
    pub fn next(self) -> Self {
        Seqnum::of(self.0.get().saturating_add(1)).unwrap_or(Seqnum::MAX)
    }
}

impl TryFrom<u32> for Seqnum {
    type Error = ();

    fn try_from(v: u32) -> Result<Self, ()> {
        Self::of(v).ok_or(())
    }
}

impl From<Seqnum> for u32 {
    fn from(seqnum: Seqnum) -> u32 {
        seqnum.0.get()
    }
}

impl fmt::Debug for Seqnum {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Seqnum({})", self.0.get())
    }
}

impl fmt::Display for Seqnum {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.get())
    }
}

/// A resolved set of sequence numbers or UIDs.
///
/// Internally, this is maintained as a minimal sorted set of inclusive ranges.
/// It does not maintain information on the original fragmentation, ordering,
/// or duplication.
///
/// The `Display` format puts this into minimal IMAP wire format.
#[derive(Clone, PartialEq, Eq)]
pub struct SeqRange<T> {
    parts: BTreeMap<u32, u32>,
    _t: PhantomData<T>,
}

impl<T> SeqRange<T> {
    /// Create a new, empty range.
    pub fn new() -> Self {
        SeqRange {
            parts: BTreeMap::new(),
            _t: PhantomData,
        }
    }

    /// Return whether this range is empty.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

impl<T: TryFrom<u32> + Into<u32> + PartialOrd> SeqRange<T> {
    /// Create a range containing just the given item.
    #[cfg(test)]
    pub fn just(item: T) -> Self {
        let mut this = SeqRange::new();
        let item: u32 = item.into();
        this.insert_raw(item, item);
        this
    }

    /// Create a range containing just a single, simple range.
    #[cfg(test)]
    pub fn range(start: T, end: T) -> Self {
        let mut this = SeqRange::new();
        this.insert(start, end);
        this
    }

    /// Insert the given inclusive range (which must be in the correct order)
    /// into this set.
    #[cfg(test)]
    pub fn insert(&mut self, start_incl: T, end_incl: T) {
        assert!(end_incl >= start_incl);
        self.insert_raw(start_incl.into(), end_incl.into());
    }

    fn insert_raw(&mut self, start_incl: u32, mut end_incl: u32) {
        // Absorb any later ranges this one overlaps or abuts
        loop {
            let following = self
                .parts
                .range((Excluded(start_incl), Unbounded))
                .next()
                .map(|(&start, &end)| (start, end));

            match following {
                Some((following_start, following_end))
                    if following_start - 1 <= end_incl =>
                {
                    end_incl = end_incl.max(following_end);
                    self.parts.remove(&following_start);
                }
                _ => break,
            }
        }

        let preceding = self
            .parts
            .range((Unbounded, Included(start_incl)))
            .next_back()
            .map(|(&start, &end)| (start, end));
        if let Some((preceding_start, preceding_end)) = preceding {
            if preceding_end.saturating_add(1) >= start_incl {
                self.parts
                    .insert(preceding_start, end_incl.max(preceding_end));
                return;
            }
        }

        self.parts.insert(start_incl, end_incl);
    }

    /// Return whether the given item is present in this set.
    pub fn contains(&self, v: T) -> bool {
        let v: u32 = v.into();
        self.parts
            .range(..=v)
            .next_back()
            .filter(|&(_, &end)| end >= v)
            .is_some()
    }

    /// Return an iterator to the items in this set.
    ///
    /// Invalid items and items greater than `max` are silently excluded.
    ///
    /// Items are delivered in strictly ascending order.
    #[cfg(test)]
    pub fn items<'a>(
        &'a self,
        max: impl Into<u32>,
    ) -> impl Iterator<Item = T> + 'a {
        let max: u32 = max.into();
        self.parts
            .iter()
            .map(|(&start, &end)| (start, end))
            .filter(move |&(start, _)| start <= max)
            .flat_map(move |(start, end)| start..=end.min(max))
            .filter_map(|v| T::try_from(v).ok())
    }
}

impl<T> fmt::Display for SeqRange<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (ix, (&start, &end)) in self.parts.iter().enumerate() {
            let delim = if 0 == ix { "" } else { "," };

            if start == end {
                write!(f, "{}{}", delim, start)?;
            } else {
                write!(f, "{}{}:{}", delim, start, end)?;
            }
        }

        Ok(())
    }
}

impl fmt::Debug for SeqRange<Seqnum> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[Seqnum {}]", self)
    }
}

impl fmt::Debug for SeqRange<Uid> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[Uid {}]", self)
    }
}

impl<T> Default for SeqRange<T> {
    fn default() -> Self {
        SeqRange::new()
    }
}

/// One endpoint of a `SeqSet` element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeqBound {
    Num(u32),
    /// `*`, the largest value currently in use.
    Star,
}

impl SeqBound {
    fn resolve(self, splat: u32) -> u32 {
        match self {
            SeqBound::Num(n) => n,
            SeqBound::Star => splat,
        }
    }
}

/// An unresolved IMAP sequence set, as supplied by the client.
///
/// Unlike `SeqRange`, this keeps `*` symbolic. What `*` means depends on the
/// state of the store at the time the set is used, which in turn is only
/// known after a scan, so resolution is left to the mailbox.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeqSet {
    parts: Vec<(SeqBound, SeqBound)>,
}

impl SeqSet {
    /// Return a set matching everything, i.e., `1:*`.
    pub fn all() -> Self {
        SeqSet {
            parts: vec![(SeqBound::Num(1), SeqBound::Star)],
        }
    }

    /// Return whether resolving this set requires knowing the value of `*`.
    pub fn has_star(&self) -> bool {
        self.parts
            .iter()
            .any(|&(a, b)| SeqBound::Star == a || SeqBound::Star == b)
    }

    /// Resolve this set against the given value of `*`.
    ///
    /// If there is nothing in the mailbox, `splat` should be 0, in which case
    /// a lone `*` matches nothing.
    pub fn resolve<T: TryFrom<u32> + Into<u32> + PartialOrd>(
        &self,
        splat: u32,
    ) -> SeqRange<T> {
        let mut range = SeqRange::new();
        for &(start, end) in &self.parts {
            let start = start.resolve(splat);
            let end = end.resolve(splat);
            // RFC 3501 allows the endpoints to be in either order
            let (lo, hi) = (start.min(end).max(1), end.max(start));
            if hi >= lo {
                range.insert_raw(lo, hi);
            }
        }
        range
    }
}

impl FromStr for SeqSet {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self, Error> {
        fn bound(r: &str) -> Result<SeqBound, Error> {
            if "*" == r {
                Ok(SeqBound::Star)
            } else {
                match r.parse::<u32>() {
                    Ok(0) | Err(_) => Err(Error::BadSequenceSet),
                    Ok(n) => Ok(SeqBound::Num(n)),
                }
            }
        }

        let mut parts = Vec::new();
        for part in raw.split(',') {
            let mut subs = part.split(':');
            match (subs.next(), subs.next(), subs.next()) {
                (Some(only), None, None) => {
                    let only = bound(only)?;
                    parts.push((only, only));
                }
                (Some(start), Some(end), None) => {
                    parts.push((bound(start)?, bound(end)?));
                }
                _ => return Err(Error::BadSequenceSet),
            }
        }

        Ok(SeqSet { parts })
    }
}

impl fmt::Display for SeqSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fn bound(f: &mut fmt::Formatter, b: SeqBound) -> fmt::Result {
            match b {
                SeqBound::Num(n) => write!(f, "{}", n),
                SeqBound::Star => write!(f, "*"),
            }
        }

        for (ix, &(start, end)) in self.parts.iter().enumerate() {
            if 0 != ix {
                write!(f, ",")?;
            }
            bound(f, start)?;
            if start != end {
                write!(f, ":")?;
                bound(f, end)?;
            }
        }

        Ok(())
    }
}

/// A message flag.
///
/// System flags are represented as top-level enum values. Keywords are in the
/// `Keyword` case; they can be named in requests but an mbox store has
/// nowhere to keep them.
///
/// The `Display` format of this type is the exact string value that would be
/// sent over the wire. `FromStr` does the reverse conversion, and also
/// understands non-standard casing of the system flags.
#[derive(Clone)]
pub enum Flag {
    Answered,
    Deleted,
    Draft,
    Flagged,
    Seen,
    Keyword(String),
}

impl Flag {
    /// The flags that can be persisted, i.e., `PERMANENTFLAGS`.
    pub fn permanent() -> Vec<Flag> {
        vec![
            Flag::Seen,
            Flag::Answered,
            Flag::Flagged,
            Flag::Deleted,
            Flag::Draft,
        ]
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Flag::Answered => write!(f, "\\Answered"),
            Flag::Deleted => write!(f, "\\Deleted"),
            Flag::Draft => write!(f, "\\Draft"),
            Flag::Flagged => write!(f, "\\Flagged"),
            Flag::Seen => write!(f, "\\Seen"),
            Flag::Keyword(ref kw) => write!(f, "{}", kw),
        }
    }
}

impl fmt::Debug for Flag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        <Flag as fmt::Display>::fmt(self, f)
    }
}

impl FromStr for Flag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        if s.eq_ignore_ascii_case("\\answered") {
            Ok(Flag::Answered)
        } else if s.eq_ignore_ascii_case("\\deleted") {
            Ok(Flag::Deleted)
        } else if s.eq_ignore_ascii_case("\\draft") {
            Ok(Flag::Draft)
        } else if s.eq_ignore_ascii_case("\\flagged") {
            Ok(Flag::Flagged)
        } else if s.eq_ignore_ascii_case("\\seen") {
            Ok(Flag::Seen)
        } else if s.starts_with('\\') {
            Err(Error::NxFlag)
        } else if !s.is_empty() && s.bytes().all(is_atom_char) {
            Ok(Flag::Keyword(s.to_owned()))
        } else {
            Err(Error::UnsafeName)
        }
    }
}

fn is_atom_char(ch: u8) -> bool {
    !matches!(
        ch,
        0..=b' '
            | 127..=255
            | b'(' | b')' | b'{' | b'*' | b'%' | b'\\' | b'"' | b']'
    )
}

impl PartialEq for Flag {
    fn eq(&self, other: &Flag) -> bool {
        match (self, other) {
            (&Flag::Answered, &Flag::Answered) => true,
            (&Flag::Deleted, &Flag::Deleted) => true,
            (&Flag::Draft, &Flag::Draft) => true,
            (&Flag::Flagged, &Flag::Flagged) => true,
            (&Flag::Seen, &Flag::Seen) => true,
            // Keywords are compared case-insensitively, but only in ASCII.
            (&Flag::Keyword(ref a), &Flag::Keyword(ref b)) => {
                a.eq_ignore_ascii_case(b)
            }
            _ => false,
        }
    }
}

impl Eq for Flag {}

/// Attributes that may be applied to mailboxes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MailboxAttribute {
    /// An mbox file can't contain other mailboxes.
    Noinferiors,
    Subscribed,
}

impl MailboxAttribute {
    pub fn name(&self) -> &'static str {
        match *self {
            MailboxAttribute::Noinferiors => "\\Noinferiors",
            MailboxAttribute::Subscribed => "\\Subscribed",
        }
    }
}

impl fmt::Display for MailboxAttribute {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl fmt::Debug for MailboxAttribute {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        <MailboxAttribute as fmt::Display>::fmt(self, f)
    }
}

/// The information a `LIST` response reports about a mailbox.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MailboxInfo {
    pub name: String,
    pub delimiter: Option<char>,
    pub attributes: Vec<MailboxAttribute>,
}

/// The items a `STATUS` command can ask for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusItem {
    Messages,
    Recent,
    UidNext,
    UidValidity,
    Unseen,
}

impl FromStr for StatusItem {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.to_ascii_uppercase().as_str() {
            "MESSAGES" => Ok(StatusItem::Messages),
            "RECENT" => Ok(StatusItem::Recent),
            "UIDNEXT" => Ok(StatusItem::UidNext),
            "UIDVALIDITY" => Ok(StatusItem::UidValidity),
            "UNSEEN" => Ok(StatusItem::Unseen),
            _ => Err(Error::BadSearchQuery(format!("status item {}", s))),
        }
    }
}

/// The result of `Mailbox::status()`.
///
/// Everything is computed regardless of what was asked for; `items` records
/// the request so that a protocol layer knows what to report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MailboxStatus {
    pub name: String,
    pub items: Vec<StatusItem>,
    /// The total number of records in the store, including those without a
    /// usable UID.
    pub messages: usize,
    /// mbox has no concept of `\Recent`, so this is always 0.
    pub recent: usize,
    pub uid_next: Uid,
    pub uid_validity: u32,
    /// The number of messages without `\Seen`.
    pub unseen: usize,
    /// The sequence number of the first message without `\Seen`.
    pub first_unseen: Option<Seqnum>,
    pub read_only: bool,
    pub permanent_flags: Vec<Flag>,
}

/// How `update_messages_flags` combines the given flags with the existing
/// ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlagsOp {
    /// `FLAGS`: replace the flags outright.
    Set,
    /// `+FLAGS`
    Add,
    /// `-FLAGS`
    Remove,
}

/// The new state of one message after `update_messages_flags()`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdatedFlags {
    pub seqnum: Seqnum,
    pub uid: Uid,
    pub flags: Vec<Flag>,
}

/// A single item requested by a `FETCH` command.
///
/// The `ALL`, `FAST`, and `FULL` macros are expanded by the parser.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchItem {
    Envelope,
    Flags,
    InternalDate,
    Rfc822Size,
    Uid,
    /// The non-extensible `BODY` structure.
    Body,
    BodyStructure,
    Section(BodySection),
}

/// The query for the `SEARCH` command.
///
/// This is a direct representation of the IMAP search key AST. Top-level
/// queries in a request are ANDed together.
#[derive(Clone, Debug)]
pub enum SearchQuery {
    SequenceSet(SeqSet),
    All,
    Answered,
    Bcc(String),
    Before(NaiveDate),
    Body(String),
    Cc(String),
    Deleted,
    Draft,
    Flagged,
    From(String),
    Header(String, String),
    Keyword(String),
    Larger(u32),
    New,
    Not(Box<SearchQuery>),
    Old,
    On(NaiveDate),
    Or(Box<SearchQuery>, Box<SearchQuery>),
    Recent,
    Seen,
    SentBefore(NaiveDate),
    SentOn(NaiveDate),
    SentSince(NaiveDate),
    Since(NaiveDate),
    Smaller(u32),
    Subject(String),
    Text(String),
    To(String),
    UidSet(SeqSet),
    Unanswered,
    Undeleted,
    Undraft,
    Unflagged,
    Unkeyword(String),
    Unseen,
    And(Vec<SearchQuery>),
}

impl SearchQuery {
    /// Return whether this query or any sub-query contains a sequence set
    /// using `*`.
    pub fn has_star(&self) -> bool {
        match *self {
            SearchQuery::SequenceSet(ref s) | SearchQuery::UidSet(ref s) => {
                s.has_star()
            }
            SearchQuery::Not(ref q) => q.has_star(),
            SearchQuery::Or(ref a, ref b) => a.has_star() || b.has_star(),
            SearchQuery::And(ref qs) => qs.iter().any(SearchQuery::has_star),
            _ => false,
        }
    }
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::*;

    fn assert_sr(
        expected_content: &[u32],
        expected_string: &str,
        seqrange: SeqRange<Uid>,
    ) {
        let actual: Vec<u32> =
            seqrange.items(u32::MAX).map(|u| u.0.get()).collect();
        assert_eq!(expected_content, &actual[..]);
        assert_eq!(expected_string, &seqrange.to_string());
    }

    fn resolve(raw: &str, splat: u32) -> SeqRange<Uid> {
        raw.parse::<SeqSet>().unwrap().resolve(splat)
    }

    #[test]
    fn seqset_resolution() {
        assert_sr(&[1], "1", resolve("1", 10));
        assert_sr(&[10], "10", resolve("*", 10));
        assert_sr(&[1, 2], "1:2", resolve("2:1", 10));
        assert_sr(&[9, 10], "9:10", resolve("9:*", 10));
        assert_sr(&[9, 10], "9:10", resolve("*:9", 10));
        assert_sr(&[1, 3, 5], "1,3,5", resolve("3,5,1", 10));
        assert_sr(&[1, 2, 3, 4], "1:4", resolve("1:2,3,4", 10));
        assert_sr(&[1, 2, 3, 4], "1:4", resolve("2:3,1:4", 10));
        assert_sr(&[1, 2, 3, 4], "1:4", resolve("1,3:2,4", 10));
        // Star past the end of the range still includes the real end
        assert_sr(&[3, 4, 5], "3:5", resolve("5:*", 3));
        // Empty mailbox
        assert_sr(&[], "", resolve("*", 0));
        assert_sr(&[1], "1", resolve("1:*", 0));
    }

    #[test]
    fn seqset_parse_errors() {
        assert!("".parse::<SeqSet>().is_err());
        assert!("0".parse::<SeqSet>().is_err());
        assert!("1:2:3".parse::<SeqSet>().is_err());
        assert!("1,,2".parse::<SeqSet>().is_err());
        assert!("x".parse::<SeqSet>().is_err());
    }

    #[test]
    fn seqset_display() {
        assert_eq!("1:*", SeqSet::all().to_string());
        assert_eq!("3,5:*", "3,5:*".parse::<SeqSet>().unwrap().to_string());
        assert!("3,5:*".parse::<SeqSet>().unwrap().has_star());
        assert!(!"3,5:7".parse::<SeqSet>().unwrap().has_star());
    }

    #[test]
    fn flag_parsing() {
        assert_eq!(Flag::Seen, "\\SEEN".parse().unwrap());
        assert_eq!(Flag::Answered, "\\answered".parse().unwrap());
        assert_eq!(
            Flag::Keyword("$Junk".to_owned()),
            "$junk".parse().unwrap()
        );
        assert!(matches!("\\Recent".parse::<Flag>(), Err(Error::NxFlag)));
        assert!(matches!("a b".parse::<Flag>(), Err(Error::UnsafeName)));
        assert!(matches!("".parse::<Flag>(), Err(Error::UnsafeName)));
    }

    #[test]
    fn uid_overflow() {
        assert_eq!(None, Uid::MAX.next());
        assert_eq!(Uid::MAX, Uid::MAX.saturating_next());
        assert_eq!(Some(Uid::u(2)), Uid::MIN.next());
        assert_eq!(None, Uid::of(0));
    }

    proptest! {
        #[test]
        fn seqrange_properties(
            ranges in prop::collection::vec((1u32..30, 1u32..=10), 1..=5)
        ) {
            let mut expected = Vec::new();
            let mut seqrange = SeqRange::new();

            for &(start, extent) in &ranges {
                seqrange.insert(Uid::u(start), Uid::u(start + extent));
                expected.extend(start..=start + extent);
            }

            expected.sort_unstable();
            expected.dedup();

            let actual: Vec<u32> = seqrange.items(u32::MAX).map(
                |u| u.0.get()).collect();
            assert_eq!(expected, actual);

            for i in 1..50 {
                assert_eq!(
                    expected.contains(&i),
                    seqrange.contains(Uid::u(i)),
                    "Bad contains result for {}",
                    i
                );
            }

            // Round-trips through the unresolved form
            let reparsed: SeqRange<Uid> = seqrange
                .to_string()
                .parse::<SeqSet>()
                .unwrap()
                .resolve(u32::MAX);
            assert_eq!(seqrange, reparsed);
        }
    }
}
