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

//! Backend for evaluating search matches.
//!
//! Searches are evaluated by a simple stack machine whose values are a
//! false/true/unknown tri-state. The maximum stack height is 32, after which
//! old values are forgotten. Stack underflow results in false.
//!
//! "Unknown" is what lets a search be evaluated in stages: a value which
//! hasn't been loaded into `SearchData` yet evaluates to unknown, and the
//! caller only needs to load more once the result as a whole is unknown.

use std::cmp::{Ord, Ordering};
use std::sync::Arc;

use chrono::prelude::*;
use regex::Regex;

use crate::account::model::*;
use crate::support::error::Error;

/// A single operation on the stack machine.
///
/// Regex matching is unanchored.
///
/// "Comparison" operations take 3 booleans indicating the results for
/// less-than, equals, and greater-than comparisons, respectively. Comparison
/// is performed as `<value-in-message> <op> <value-in-op>`.
#[derive(Debug)]
pub enum Op {
    True,
    False,
    And,
    Or,
    Not,
    Flag(Flag),
    /// Header names are lower-case.
    Header(String, Regex),
    AnyHeader(Arc<Regex>),
    Content(Arc<Regex>),
    InternalDateCompare(NaiveDate, bool, bool, bool),
    DateCompare(NaiveDate, bool, bool, bool),
    SizeCompare(u32, bool, bool, bool),
    SeqnumIn(SeqRange<Seqnum>),
    UidIn(SeqRange<Uid>),
    #[cfg(test)]
    _Const(u64),
}

/// What is known about the message being evaluated.
///
/// Fields left as `None` evaluate to "unknown".
#[derive(Clone, Debug, Default)]
pub struct SearchData {
    pub seqnum: Option<Seqnum>,
    pub uid: Option<Uid>,
    pub flags: Option<Vec<Flag>>,
    pub size: Option<u32>,
    pub internal_date: Option<DateTime<FixedOffset>>,
    /// Every header field in order, with lower-case names and decoded
    /// values.
    pub headers: Option<Vec<(String, String)>>,
    /// The `Date` header, or a description of why it can't be used.
    pub date: Option<Result<DateTime<FixedOffset>, String>>,
    /// The decoded text of the message body.
    pub content: Option<String>,
}

const UNKNOWN: u64 = 2;
const TRUE: u64 = 1;

struct Stack(u64);

impl Stack {
    fn push(&mut self, val: u64) {
        self.0 <<= 2;
        self.0 |= val;
    }

    fn o(&mut self, val: Option<bool>) {
        self.push(val.map(|v| v as u64).unwrap_or(UNKNOWN));
    }

    fn and(&mut self) {
        let key = self.0 & 15;
        self.0 >>= 2;
        self.0 &= !3;
        const TABLE: u64 =
        // A: 11 11 11 11 10 10 10 10 01 01 01 01 00 00 00 00
        // B: 11 10 01 00 11 10 01 00 11 10 01 00 11 10 01 00
            0b11_11_11_00_11_11_11_00_11_11_01_00_00_00_00_00;
        self.0 |= (TABLE >> (2 * key)) & 3;
    }

    fn or(&mut self) {
        let key = self.0 & 15;
        self.0 >>= 2;
        self.0 &= !3;
        const TABLE: u64 =
        // A: 11 11 11 11 10 10 10 10 01 01 01 01 00 00 00 00
        // B: 11 10 01 00 11 10 01 00 11 10 01 00 11 10 01 00
            0b11_11_01_11_11_11_01_11_01_01_01_01_11_11_01_00;
        self.0 |= (TABLE >> (2 * key)) & 3;
    }

    fn not(&mut self) {
        self.0 ^= TRUE;
    }
}

/// Evaluate whether `data` is matched by the stack machine given in `ops`.
///
/// Returns `None` if the result depends on something `data` doesn't have
/// yet. Fails with `Error::Predicate` if a predicate can't be evaluated for
/// this message at all, such as a `SENT*` comparison on a message without a
/// usable `Date` header.
pub fn eval(ops: &[Op], data: &SearchData) -> Result<Option<bool>, Error> {
    let mut s = Stack(0u64);

    for op in ops {
        match *op {
            Op::True => s.push(TRUE),
            Op::False => s.push(0),
            Op::And => s.and(),
            Op::Or => s.or(),
            Op::Not => s.not(),
            #[cfg(test)]
            Op::_Const(v) => s.push(v),

            Op::Flag(ref flag) => {
                s.o(data.flags.as_ref().map(|f| f.contains(flag)))
            }

            Op::Header(ref name, ref r) => {
                s.o(data.headers.as_ref().map(|h| {
                    h.iter().any(|&(ref n, ref v)| n == name && r.is_match(v))
                }));
            }
            Op::AnyHeader(ref r) => {
                s.o(data
                    .headers
                    .as_ref()
                    .map(|h| h.iter().any(|&(_, ref v)| r.is_match(v))));
            }
            Op::Content(ref r) => {
                s.o(data.content.as_ref().map(|v| r.is_match(v)))
            }

            Op::InternalDateCompare(ref relative, lt, eq, gt) => {
                s.o(cmp_date(
                    data.internal_date.as_ref(),
                    relative,
                    lt,
                    eq,
                    gt,
                ));
            }
            Op::DateCompare(ref relative, lt, eq, gt) => {
                let date = match data.date {
                    None => None,
                    Some(Ok(ref date)) => Some(date),
                    Some(Err(ref why)) => {
                        return Err(Error::Predicate(why.clone()))
                    }
                };
                s.o(cmp_date(date, relative, lt, eq, gt));
            }
            Op::SizeCompare(ref relative, lt, eq, gt) => {
                s.o(cmp(data.size.as_ref(), relative, lt, eq, gt));
            }

            Op::SeqnumIn(ref set) => {
                s.o(data.seqnum.map(|n| set.contains(n)))
            }
            Op::UidIn(ref set) => s.o(data.uid.map(|u| set.contains(u))),
        }
    }

    Ok(if UNKNOWN == s.0 & UNKNOWN {
        None
    } else {
        Some(TRUE == s.0 & TRUE)
    })
}

fn cmp<T: Ord>(
    value: Option<&T>,
    relative: &T,
    lt: bool,
    eq: bool,
    gt: bool,
) -> Option<bool> {
    value.map(|value| match value.cmp(relative) {
        Ordering::Less => lt,
        Ordering::Equal => eq,
        Ordering::Greater => gt,
    })
}

fn cmp_date(
    value: Option<&DateTime<FixedOffset>>,
    relative: &NaiveDate,
    lt: bool,
    eq: bool,
    gt: bool,
) -> Option<bool> {
    let value = value.map(|v| v.naive_local().date());
    cmp(value.as_ref(), relative, lt, eq, gt)
}

/// Determine whether `ops` needs the decoded body text of the message.
///
/// Decoding the body is by far the most expensive part of loading a
/// message, so it is skipped when nothing looks at it.
pub fn wants_content(ops: &[Op]) -> bool {
    ops.iter().any(|op| matches!(*op, Op::Content(..)))
}

#[cfg(test)]
mod test {
    use super::*;

    fn eval_ok(ops: &[Op], data: &SearchData) -> Option<bool> {
        eval(ops, data).unwrap()
    }

    fn tristate(known: bool, truth: bool) -> u64 {
        let mut v = 0;
        if !known {
            v |= UNKNOWN;
        }
        if truth {
            v |= TRUE;
        }
        v
    }

    #[test]
    fn single_primitive_fields() {
        let ops = &[Op::UidIn(SeqRange::range(Uid::u(10), Uid::u(20)))];
        assert_eq!(None, eval_ok(ops, &SearchData::default()));
        for &(uid, expected) in
            &[(9, false), (10, true), (20, true), (21, false)]
        {
            assert_eq!(
                Some(expected),
                eval_ok(
                    ops,
                    &SearchData {
                        uid: Some(Uid::u(uid)),
                        ..SearchData::default()
                    }
                )
            );
        }

        let ops = &[Op::SeqnumIn(SeqRange::just(Seqnum::u(2)))];
        assert_eq!(None, eval_ok(ops, &SearchData::default()));
        assert_eq!(
            Some(true),
            eval_ok(
                ops,
                &SearchData {
                    seqnum: Some(Seqnum::u(2)),
                    ..SearchData::default()
                }
            )
        );

        let ops = &[Op::SizeCompare(100, true, false, false)];
        assert_eq!(None, eval_ok(ops, &SearchData::default()));
        for &(size, expected) in &[(99, true), (100, false), (101, false)] {
            assert_eq!(
                Some(expected),
                eval_ok(
                    ops,
                    &SearchData {
                        size: Some(size),
                        ..SearchData::default()
                    }
                )
            );
        }
    }

    #[test]
    fn flags() {
        let ops = &[Op::Flag(Flag::Flagged)];
        assert_eq!(None, eval_ok(ops, &SearchData::default()));
        assert_eq!(
            Some(true),
            eval_ok(
                ops,
                &SearchData {
                    flags: Some(vec![Flag::Flagged]),
                    ..SearchData::default()
                }
            )
        );
        assert_eq!(
            Some(false),
            eval_ok(
                ops,
                &SearchData {
                    flags: Some(vec![Flag::Deleted]),
                    ..SearchData::default()
                }
            )
        );
    }

    #[test]
    fn headers() {
        let data = SearchData {
            headers: Some(vec![
                ("received".to_owned(), "from a".to_owned()),
                ("received".to_owned(), "from b".to_owned()),
                ("subject".to_owned(), "Where is the food".to_owned()),
            ]),
            ..SearchData::default()
        };

        let ops =
            &[Op::Header("received".to_owned(), Regex::new("b").unwrap())];
        assert_eq!(None, eval_ok(ops, &SearchData::default()));
        assert_eq!(Some(true), eval_ok(ops, &data));

        let ops =
            &[Op::Header("subject".to_owned(), Regex::new("b").unwrap())];
        assert_eq!(Some(false), eval_ok(ops, &data));

        let ops = &[Op::AnyHeader(Arc::new(Regex::new("food").unwrap()))];
        assert_eq!(Some(true), eval_ok(ops, &data));

        let ops = &[Op::Content(Arc::new(Regex::new("food").unwrap()))];
        assert_eq!(None, eval_ok(ops, &data));
    }

    #[test]
    fn date_compare() {
        let datetime0 =
            DateTime::parse_from_rfc3339("2020-06-28T12:34:56+23:59").unwrap();
        let datetime1 =
            DateTime::parse_from_rfc3339("2020-06-29T23:12:01-12:34").unwrap();
        let datetime2 =
            DateTime::parse_from_rfc3339("2020-06-30T08:04:02-23:59").unwrap();
        let date1 = NaiveDate::from_ymd(2020, 6, 29);

        let ops = &[Op::InternalDateCompare(date1, false, true, true)];
        assert_eq!(None, eval_ok(ops, &SearchData::default()));
        for &(dt, expected) in
            &[(datetime0, false), (datetime1, true), (datetime2, true)]
        {
            assert_eq!(
                Some(expected),
                eval_ok(
                    ops,
                    &SearchData {
                        internal_date: Some(dt),
                        ..SearchData::default()
                    }
                )
            );
        }

        let ops = &[Op::DateCompare(date1, true, false, false)];
        assert_eq!(None, eval_ok(ops, &SearchData::default()));
        for &(dt, expected) in
            &[(datetime0, true), (datetime1, false), (datetime2, false)]
        {
            assert_eq!(
                Some(expected),
                eval_ok(
                    ops,
                    &SearchData {
                        date: Some(Ok(dt)),
                        ..SearchData::default()
                    }
                )
            );
        }
    }

    #[test]
    fn unusable_date_is_predicate_failure() {
        let ops = &[
            Op::DateCompare(
                NaiveDate::from_ymd(2020, 1, 1),
                true,
                false,
                false,
            ),
            Op::Not,
        ];
        assert!(matches!(
            eval(
                ops,
                &SearchData {
                    date: Some(Err("no Date header".to_owned())),
                    ..SearchData::default()
                }
            ),
            Err(Error::Predicate(..))
        ));
    }

    #[test]
    fn constants() {
        let data = SearchData::default();
        assert_eq!(Some(true), eval_ok(&[Op::True], &data));
        assert_eq!(Some(false), eval_ok(&[Op::False], &data));
        assert_eq!(Some(true), eval_ok(&[Op::False, Op::Not], &data));
        assert_eq!(Some(false), eval_ok(&[], &data));
    }

    #[test]
    fn test_and() {
        for i in 0..16 {
            let (a_known, a_true) = (0 != i & 1, 0 != i & 2);
            let (b_known, b_true) = (0 != i & 4, 0 != i & 8);

            let ops = &[
                Op::_Const(tristate(a_known, a_true)),
                Op::_Const(tristate(b_known, b_true)),
                Op::And,
            ];
            let result = eval_ok(ops, &SearchData::default());

            if (a_known && !a_true) || (b_known && !b_true) {
                assert_eq!(Some(false), result);
            } else if a_known && a_true && b_known && b_true {
                assert_eq!(Some(true), result);
            } else {
                assert_eq!(None, result);
            }
        }
    }

    #[test]
    fn test_or_nested() {
        // Mainly ensures that the bit twiddling in the combinators doesn't
        // disturb other stack elements.
        for i in 0..64 {
            let (a_known, a_true) = (0 != i & 1, 0 != i & 2);
            let (b_known, b_true) = (0 != i & 4, 0 != i & 8);
            let (c_known, c_true) = (0 != i & 16, 0 != i & 32);

            let ops = &[
                Op::_Const(tristate(a_known, a_true)),
                Op::_Const(tristate(b_known, b_true)),
                Op::Or,
                Op::_Const(tristate(c_known, c_true)),
                Op::Or,
            ];
            let result = eval_ok(ops, &SearchData::default());

            if (a_known && a_true) || (b_known && b_true) || (c_known && c_true)
            {
                assert_eq!(Some(true), result);
            } else if a_known && b_known && c_known {
                assert_eq!(Some(false), result);
            } else {
                assert_eq!(None, result);
            }
        }
    }

    #[test]
    fn test_not() {
        let ops = &[Op::Flag(Flag::Seen), Op::Not];
        assert_eq!(None, eval_ok(ops, &SearchData::default()));
        assert_eq!(
            Some(true),
            eval_ok(
                ops,
                &SearchData {
                    flags: Some(vec![]),
                    ..SearchData::default()
                }
            )
        );
    }

    #[test]
    fn content_detection() {
        assert!(!wants_content(&[Op::True, Op::Flag(Flag::Seen), Op::And]));
        assert!(wants_content(&[
            Op::True,
            Op::Content(Arc::new(Regex::new("x").unwrap())),
            Op::Or,
        ]));
    }
}
