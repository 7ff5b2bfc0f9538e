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

//! Parsers for the IMAP syntax fragments Mboxmap accepts from its users.
//!
//! These cover the arguments of the `FETCH`, `SEARCH`, `STORE`, and `STATUS`
//! commands, i.e., fetch attributes, search keys, flag lists, and status
//! items, following the formal syntax of RFC 3501. They produce the model
//! types of `crate::account::model` directly.
//!
//! Literals are not supported since the input is always a complete string.
//! Sequence sets are recognised here but interpreted by `SeqSet`.

use std::str;

use chrono::prelude::*;
use nom::{
    branch::alt,
    bytes::complete::{
        is_not, tag, tag_no_case as kw, take, take_while1, take_while_m_n,
    },
    character::is_digit,
    combinator::{all_consuming, map, map_opt, not, opt, value},
    error::ErrorKind,
    multi::{fold_many0, separated_list0, separated_list1},
    sequence::{delimited, pair, preceded, separated_pair, terminated, tuple},
    IResult,
};

use crate::account::model::*;
use crate::mime::fetch::section::{BodySection, Imap2Section, LeafType};
use crate::support::error::Error;

/// Parse the attribute list of a `FETCH` command.
///
/// The `ALL`, `FAST`, and `FULL` macros are expanded. Attribute names that
/// aren't understood are dropped.
pub fn fetch_items(input: &str) -> Result<Vec<FetchItem>, Error> {
    finish(fetch_spec, input)
        .map(|items| items.into_iter().flatten().collect())
        .map_err(Error::Syntax)
}

/// Parse the criteria of a `SEARCH` command.
///
/// The result holds the top-level keys, which are implicitly ANDed.
pub fn search_keys(input: &str) -> Result<Vec<SearchQuery>, Error> {
    finish(separated_list1(tag(" "), search_key), input)
        .map_err(Error::BadSearchQuery)
}

/// Parse a list of flags, with or without the surrounding parentheses.
pub fn flag_list(input: &str) -> Result<Vec<Flag>, Error> {
    let raw = finish(
        alt((
            delimited(tag("("), separated_list0(tag(" "), flag_atom), tag(")")),
            separated_list0(tag(" "), flag_atom),
        )),
        input,
    )
    .map_err(Error::Syntax)?;

    raw.iter().map(|f| f.parse::<Flag>()).collect()
}

/// Parse the item list of a `STATUS` command, with or without the
/// surrounding parentheses.
pub fn status_items(input: &str) -> Result<Vec<StatusItem>, Error> {
    let raw = finish(
        alt((
            delimited(
                tag("("),
                separated_list1(tag(" "), alpha_word),
                tag(")"),
            ),
            separated_list1(tag(" "), alpha_word),
        )),
        input,
    )
    .map_err(Error::Syntax)?;

    raw.iter().map(|s| s.parse::<StatusItem>()).collect()
}

/// Parse an IMAP `date-time`, as in `" 1-Feb-2020 12:00:00 +0000"`.
///
/// The surrounding quotes are optional.
pub fn date_time(input: &str) -> Result<DateTime<FixedOffset>, Error> {
    finish(
        alt((datetime_text, delimited(tag("\""), datetime_text, tag("\"")))),
        input,
    )
    .map_err(Error::Syntax)
}

/// Run `parser` over the whole of `input`, describing where it failed if it
/// doesn't accept everything.
fn finish<'a, T>(
    parser: impl FnMut(&'a [u8]) -> IResult<&'a [u8], T>,
    input: &'a str,
) -> Result<T, String> {
    match all_consuming(parser)(input.as_bytes()) {
        Ok((_, v)) => Ok(v),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(format!(
            "unexpected input at {:?}",
            String::from_utf8_lossy(e.input)
        )),
        Err(nom::Err::Incomplete(_)) => Err("unexpected end".to_owned()),
    }
}

fn is_word_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b'.' == b || b'-' == b
}

/// Match the keyword `w` case-insensitively, but only as a whole word.
fn word<'a>(
    w: &'static str,
) -> impl FnMut(&'a [u8]) -> IResult<&'a [u8], &'a [u8]> {
    terminated(kw(w), not(take_while_m_n(1, 1, is_word_char)))
}

fn alpha_word(i: &[u8]) -> IResult<&[u8], String> {
    map(take_while1(|b: u8| b.is_ascii_alphabetic()), |s: &[u8]| {
        String::from_utf8_lossy(s).into_owned()
    })(i)
}

fn normal_atom(i: &[u8]) -> IResult<&[u8], String> {
    map(
        take_while1(|b: u8| match b {
            0..=b' ' => false,
            127..=255 => false,
            b'(' | b')' | b'{' | b'*' | b'%' | b'\\' | b'"' | b']' => false,
            _ => true,
        }),
        |s: &[u8]| String::from_utf8_lossy(s).into_owned(),
    )(i)
}

// Like `normal_atom`, but keeps the backslash of system flags. Garbage like
// `foo\bar` gets through here and is rejected by `Flag::from_str`.
fn flag_atom(i: &[u8]) -> IResult<&[u8], String> {
    map(
        take_while1(|b: u8| match b {
            0..=b' ' => false,
            127..=255 => false,
            b'(' | b')' | b'{' | b'*' | b'%' | b'"' | b']' => false,
            _ => true,
        }),
        |s: &[u8]| String::from_utf8_lossy(s).into_owned(),
    )(i)
}

fn astring_atom(i: &[u8]) -> IResult<&[u8], String> {
    map(
        take_while1(|b: u8| match b {
            0..=b' ' => false,
            127..=255 => false,
            b'(' | b')' | b'{' | b'*' | b'%' | b'\\' | b'"' => false,
            _ => true,
        }),
        |s: &[u8]| String::from_utf8_lossy(s).into_owned(),
    )(i)
}

fn quoted_char(i: &[u8]) -> IResult<&[u8], &[u8]> {
    preceded(tag("\\"), alt((tag("\\"), tag("\""))))(i)
}

fn quoted(i: &[u8]) -> IResult<&[u8], String> {
    delimited(
        tag("\""),
        fold_many0(
            alt((quoted_char, is_not("\r\n\"\\"))),
            String::new,
            |mut accum: String, piece: &[u8]| {
                accum.push_str(&String::from_utf8_lossy(piece));
                accum
            },
        ),
        tag("\""),
    )(i)
}

fn astring(i: &[u8]) -> IResult<&[u8], String> {
    alt((astring_atom, quoted))(i)
}

fn number(i: &[u8]) -> IResult<&[u8], u32> {
    map_opt(take_while1(is_digit), |s: &[u8]| {
        str::from_utf8(s).ok().and_then(|s| s.parse::<u32>().ok())
    })(i)
}

fn nz_number(i: &[u8]) -> IResult<&[u8], u32> {
    map_opt(number, |n| if 0 == n { None } else { Some(n) })(i)
}

fn sequence_set(i: &[u8]) -> IResult<&[u8], SeqSet> {
    map_opt(
        take_while1(|b: u8| b.is_ascii_digit() || b":,*".contains(&b)),
        |s: &[u8]| {
            str::from_utf8(s).ok().and_then(|s| s.parse::<SeqSet>().ok())
        },
    )(i)
}

fn digits<'a>(
    n: usize,
) -> impl FnMut(&'a [u8]) -> IResult<&'a [u8], u32> {
    map_opt(take_while_m_n(n, n, is_digit), |s: &[u8]| {
        str::from_utf8(s).ok().and_then(|s| s.parse::<u32>().ok())
    })
}

static MONTH_NAMES: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov",
    "dec",
];

fn month(i: &[u8]) -> IResult<&[u8], u32> {
    map_opt(take(3usize), |name: &[u8]| {
        str::from_utf8(name).ok().and_then(|name| {
            MONTH_NAMES
                .iter()
                .position(|n| n.eq_ignore_ascii_case(name))
                .map(|ix| ix as u32 + 1)
        })
    })(i)
}

fn date_text(i: &[u8]) -> IResult<&[u8], NaiveDate> {
    map_opt(
        tuple((
            terminated(alt((digits(2), digits(1))), tag("-")),
            terminated(month, tag("-")),
            digits(4),
        )),
        |(d, m, y)| NaiveDate::from_ymd_opt(y as i32, m, d),
    )(i)
}

fn date(i: &[u8]) -> IResult<&[u8], NaiveDate> {
    alt((date_text, delimited(tag("\""), date_text, tag("\""))))(i)
}

fn datetime_text(i: &[u8]) -> IResult<&[u8], DateTime<FixedOffset>> {
    map_opt(
        tuple((
            terminated(
                alt((digits(2), preceded(tag(" "), digits(1)), digits(1))),
                tag("-"),
            ),
            terminated(month, tag("-")),
            terminated(digits(4), tag(" ")),
            terminated(
                tuple((
                    digits(2),
                    preceded(tag(":"), digits(2)),
                    preceded(tag(":"), digits(2)),
                )),
                tag(" "),
            ),
            pair(alt((tag("+"), tag("-"))), pair(digits(2), digits(2))),
        )),
        |(d, m, y, (h, min, s), (sign, (zh, zm)))| {
            let zone = (zh * 60 + zm) as i32 * 60;
            let zone = if b"-" == sign { -zone } else { zone };
            let date = NaiveDate::from_ymd_opt(y as i32, m, d)?;
            FixedOffset::east_opt(zone)?
                .from_local_datetime(&date.and_hms_opt(h, min, s)?)
                .single()
        },
    )(i)
}

fn search_key(i: &[u8]) -> IResult<&[u8], SearchQuery> {
    alt((
        map(
            delimited(
                tag("("),
                separated_list1(tag(" "), search_key),
                tag(")"),
            ),
            SearchQuery::And,
        ),
        map(sequence_set, SearchQuery::SequenceSet),
        keyed_search_key,
    ))(i)
}

fn keyed_search_key(i: &[u8]) -> IResult<&[u8], SearchQuery> {
    use crate::account::model::SearchQuery as Q;

    fn sp_date(i: &[u8]) -> IResult<&[u8], NaiveDate> {
        preceded(tag(" "), date)(i)
    }
    fn sp_astring(i: &[u8]) -> IResult<&[u8], String> {
        preceded(tag(" "), astring)(i)
    }
    fn sp_key(i: &[u8]) -> IResult<&[u8], Box<SearchQuery>> {
        map(preceded(tag(" "), search_key), Box::new)(i)
    }

    let (rest, name) = alpha_word(i)?;
    match name.to_ascii_uppercase().as_str() {
        "ALL" => Ok((rest, Q::All)),
        "ANSWERED" => Ok((rest, Q::Answered)),
        "BCC" => map(sp_astring, Q::Bcc)(rest),
        "BEFORE" => map(sp_date, Q::Before)(rest),
        "BODY" => map(sp_astring, Q::Body)(rest),
        "CC" => map(sp_astring, Q::Cc)(rest),
        "DELETED" => Ok((rest, Q::Deleted)),
        "DRAFT" => Ok((rest, Q::Draft)),
        "FLAGGED" => Ok((rest, Q::Flagged)),
        "FROM" => map(sp_astring, Q::From)(rest),
        "HEADER" => {
            map(pair(sp_astring, sp_astring), |(n, v)| Q::Header(n, v))(rest)
        }
        "KEYWORD" => map(preceded(tag(" "), normal_atom), Q::Keyword)(rest),
        "LARGER" => map(preceded(tag(" "), number), Q::Larger)(rest),
        "NEW" => Ok((rest, Q::New)),
        "NOT" => map(sp_key, Q::Not)(rest),
        "OLD" => Ok((rest, Q::Old)),
        "ON" => map(sp_date, Q::On)(rest),
        "OR" => map(pair(sp_key, sp_key), |(a, b)| Q::Or(a, b))(rest),
        "RECENT" => Ok((rest, Q::Recent)),
        "SEEN" => Ok((rest, Q::Seen)),
        "SENTBEFORE" => map(sp_date, Q::SentBefore)(rest),
        "SENTON" => map(sp_date, Q::SentOn)(rest),
        "SENTSINCE" => map(sp_date, Q::SentSince)(rest),
        "SINCE" => map(sp_date, Q::Since)(rest),
        "SMALLER" => map(preceded(tag(" "), number), Q::Smaller)(rest),
        "SUBJECT" => map(sp_astring, Q::Subject)(rest),
        "TEXT" => map(sp_astring, Q::Text)(rest),
        "TO" => map(sp_astring, Q::To)(rest),
        "UID" => map(preceded(tag(" "), sequence_set), Q::UidSet)(rest),
        "UNANSWERED" => Ok((rest, Q::Unanswered)),
        "UNDELETED" => Ok((rest, Q::Undeleted)),
        "UNDRAFT" => Ok((rest, Q::Undraft)),
        "UNFLAGGED" => Ok((rest, Q::Unflagged)),
        "UNKEYWORD" => map(preceded(tag(" "), normal_atom), Q::Unkeyword)(rest),
        "UNSEEN" => Ok((rest, Q::Unseen)),
        _ => Err(nom::Err::Error(nom::error::Error::new(i, ErrorKind::Tag))),
    }
}

fn fetch_spec(i: &[u8]) -> IResult<&[u8], Vec<Option<FetchItem>>> {
    alt((
        value(
            vec![
                Some(FetchItem::Flags),
                Some(FetchItem::InternalDate),
                Some(FetchItem::Rfc822Size),
                Some(FetchItem::Envelope),
            ],
            word("ALL"),
        ),
        value(
            vec![
                Some(FetchItem::Flags),
                Some(FetchItem::InternalDate),
                Some(FetchItem::Rfc822Size),
            ],
            word("FAST"),
        ),
        value(
            vec![
                Some(FetchItem::Flags),
                Some(FetchItem::InternalDate),
                Some(FetchItem::Rfc822Size),
                Some(FetchItem::Envelope),
                Some(FetchItem::Body),
            ],
            word("FULL"),
        ),
        delimited(tag("("), separated_list1(tag(" "), fetch_att), tag(")")),
        map(fetch_att, |att| vec![att]),
    ))(i)
}

fn fetch_att(i: &[u8]) -> IResult<&[u8], Option<FetchItem>> {
    alt((
        value(Some(FetchItem::Envelope), word("ENVELOPE")),
        value(Some(FetchItem::Flags), word("FLAGS")),
        value(Some(FetchItem::InternalDate), word("INTERNALDATE")),
        value(Some(FetchItem::Rfc822Size), word("RFC822.SIZE")),
        map(legacy_section, |s| Some(FetchItem::Section(s))),
        map(body_section, |s| Some(FetchItem::Section(s))),
        value(Some(FetchItem::BodyStructure), word("BODYSTRUCTURE")),
        value(Some(FetchItem::Body), word("BODY")),
        value(Some(FetchItem::Uid), word("UID")),
        value(None, take_while1(|b| b' ' != b && b'(' != b && b')' != b)),
    ))(i)
}

fn legacy_section(i: &[u8]) -> IResult<&[u8], BodySection> {
    map(
        alt((
            value(
                (LeafType::Headers, Imap2Section::Rfc822Header),
                word("RFC822.HEADER"),
            ),
            value(
                (LeafType::Text, Imap2Section::Rfc822Text),
                word("RFC822.TEXT"),
            ),
            value((LeafType::Full, Imap2Section::Rfc822), word("RFC822")),
        )),
        |(leaf_type, legacy)| BodySection {
            leaf_type,
            report_as_legacy: Some(legacy),
            // RFC822.HEADER is the one legacy form that doesn't set \Seen
            peek: Imap2Section::Rfc822Header == legacy,
            ..BodySection::default()
        },
    )(i)
}

/// The parsed form of a `section-msgtext` or `section-text`.
type SectionText = (LeafType, Vec<String>, bool);

fn section_msgtext(i: &[u8]) -> IResult<&[u8], SectionText> {
    alt((
        map(
            tuple((
                kw("HEADER.FIELDS"),
                opt(kw(".NOT")),
                preceded(
                    tag(" "),
                    delimited(
                        tag("("),
                        separated_list1(tag(" "), astring),
                        tag(")"),
                    ),
                ),
            )),
            |(_, not, fields)| (LeafType::Headers, fields, not.is_some()),
        ),
        value((LeafType::Headers, vec![], false), kw("HEADER")),
        value((LeafType::Text, vec![], false), kw("TEXT")),
    ))(i)
}

fn section_text(i: &[u8]) -> IResult<&[u8], SectionText> {
    alt((
        section_msgtext,
        value((LeafType::Mime, vec![], false), kw("MIME")),
    ))(i)
}

fn section_spec(i: &[u8]) -> IResult<&[u8], (Vec<u32>, Option<SectionText>)> {
    alt((
        map(section_msgtext, |text| (vec![], Some(text))),
        pair(
            separated_list1(tag("."), nz_number),
            opt(preceded(tag("."), section_text)),
        ),
    ))(i)
}

fn body_section(i: &[u8]) -> IResult<&[u8], BodySection> {
    map(
        tuple((
            alt((value(true, kw("BODY.PEEK")), value(false, kw("BODY")))),
            delimited(tag("["), opt(section_spec), tag("]")),
            opt(delimited(
                tag("<"),
                separated_pair(number, tag("."), nz_number),
                tag(">"),
            )),
        )),
        |(peek, spec, partial)| {
            let (subscripts, text) = spec.unwrap_or_default();
            let (leaf_type, header_filter, discard_matching_headers) = text
                .unwrap_or_else(|| {
                    let leaf = if subscripts.is_empty() {
                        LeafType::Full
                    } else {
                        LeafType::Content
                    };
                    (leaf, vec![], false)
                });

            BodySection {
                subscripts,
                leaf_type,
                header_filter,
                discard_matching_headers,
                partial: partial.map(|(start, len)| {
                    (u64::from(start), u64::from(start) + u64::from(len))
                }),
                report_as_legacy: None,
                peek,
            }
        },
    )(i)
}

#[cfg(test)]
mod test {
    use super::*;

    fn section(text: &str) -> BodySection {
        match fetch_items(text).unwrap().pop() {
            Some(FetchItem::Section(s)) => s,
            other => panic!("Unexpected item: {:?}", other),
        }
    }

    #[test]
    fn fetch_macros() {
        assert_eq!(
            vec![
                FetchItem::Flags,
                FetchItem::InternalDate,
                FetchItem::Rfc822Size,
            ],
            fetch_items("fast").unwrap()
        );
        assert_eq!(4, fetch_items("ALL").unwrap().len());
        assert_eq!(
            Some(&FetchItem::Body),
            fetch_items("FULL").unwrap().last()
        );
    }

    #[test]
    fn fetch_simple_atts() {
        assert_eq!(
            vec![
                FetchItem::Uid,
                FetchItem::Flags,
                FetchItem::Envelope,
                FetchItem::BodyStructure,
                FetchItem::Body,
            ],
            fetch_items("(UID flags ENVELOPE BODYSTRUCTURE BODY)").unwrap()
        );
        assert_eq!(vec![FetchItem::Uid], fetch_items("UID").unwrap());
    }

    #[test]
    fn fetch_unknown_atts_are_dropped() {
        assert_eq!(
            vec![FetchItem::Uid, FetchItem::Flags],
            fetch_items("(UID X-GM-MSGID BINARY[1] FLAGS)").unwrap()
        );
        assert_eq!(
            vec![FetchItem::Flags],
            fetch_items("(FLAGSX FLAGS)").unwrap()
        );
        assert!(fetch_items("(UID").is_err());
        assert!(fetch_items("").is_err());
    }

    #[test]
    fn fetch_sections() {
        assert_eq!(BodySection::default(), section("BODY[]"));
        assert_eq!(
            BodySection {
                peek: true,
                partial: Some((10, 30)),
                ..BodySection::default()
            },
            section("BODY.PEEK[]<10.20>")
        );
        assert_eq!(
            BodySection {
                subscripts: vec![1, 2],
                leaf_type: LeafType::Content,
                ..BodySection::default()
            },
            section("BODY[1.2]")
        );
        assert_eq!(
            BodySection {
                subscripts: vec![3],
                leaf_type: LeafType::Mime,
                ..BodySection::default()
            },
            section("body[3.MIME]")
        );
        assert_eq!(
            BodySection {
                leaf_type: LeafType::Headers,
                header_filter: vec!["From".to_owned(), "Subject".to_owned()],
                ..BodySection::default()
            },
            section("BODY[HEADER.FIELDS (From Subject)]")
        );
        assert_eq!(
            BodySection {
                subscripts: vec![2],
                leaf_type: LeafType::Headers,
                header_filter: vec!["X-UID".to_owned()],
                discard_matching_headers: true,
                ..BodySection::default()
            },
            section("BODY[2.HEADER.FIELDS.NOT (X-UID)]")
        );
        assert_eq!(
            BodySection {
                leaf_type: LeafType::Text,
                ..BodySection::default()
            },
            section("BODY[TEXT]")
        );
        assert!(fetch_items("BODY[0]").is_err());
    }

    #[test]
    fn fetch_legacy_sections() {
        let s = section("RFC822.HEADER");
        assert_eq!(LeafType::Headers, s.leaf_type);
        assert_eq!(Some(Imap2Section::Rfc822Header), s.report_as_legacy);
        assert!(s.peek);
        assert_eq!("RFC822.HEADER", s.to_string());

        let s = section("RFC822");
        assert_eq!(LeafType::Full, s.leaf_type);
        assert!(!s.peek);

        assert_eq!(
            vec![FetchItem::Rfc822Size],
            fetch_items("RFC822.SIZE").unwrap()
        );
    }

    #[test]
    fn search_simple_keys() {
        let keys = search_keys("SEEN unanswered ALL").unwrap();
        assert_eq!(3, keys.len());
        assert!(matches!(keys[0], SearchQuery::Seen));
        assert!(matches!(keys[1], SearchQuery::Unanswered));
        assert!(matches!(keys[2], SearchQuery::All));
    }

    #[test]
    fn search_keys_with_arguments() {
        let keys = search_keys(
            "FROM alice SUBJECT \"hello world\" HEADER X-Mailer \"\" \
             LARGER 1024 SINCE 1-Feb-2020 SENTBEFORE \"02-Mar-2021\" \
             KEYWORD $Junk UID 5:*",
        )
        .unwrap();

        use SearchQuery as Q;
        assert_eq!(8, keys.len());
        assert!(matches!(keys[0], Q::From(ref s) if "alice" == *s));
        assert!(matches!(keys[1], Q::Subject(ref s) if "hello world" == *s));
        assert!(matches!(
            keys[2],
            Q::Header(ref n, ref v) if "X-Mailer" == *n && v.is_empty()
        ));
        assert!(matches!(keys[3], Q::Larger(1024)));
        assert!(matches!(
            keys[4],
            Q::Since(d) if NaiveDate::from_ymd(2020, 2, 1) == d
        ));
        assert!(matches!(
            keys[5],
            Q::SentBefore(d) if NaiveDate::from_ymd(2021, 3, 2) == d
        ));
        assert!(matches!(keys[6], Q::Keyword(ref k) if "$Junk" == *k));
        assert!(matches!(keys[7], Q::UidSet(ref s) if "5:*" == s.to_string()));
    }

    #[test]
    fn search_compound_keys() {
        let keys = search_keys("OR (SEEN FLAGGED) NOT 1:3,7 2").unwrap();
        assert_eq!(2, keys.len());
        match keys[0] {
            SearchQuery::Or(ref a, ref b) => {
                assert!(matches!(**a, SearchQuery::And(ref v) if 2 == v.len()));
                match **b {
                    SearchQuery::Not(ref sub) => assert!(matches!(
                        **sub,
                        SearchQuery::SequenceSet(ref s)
                            if "1:3,7" == s.to_string()
                    )),
                    ref k => panic!("Unexpected key: {:?}", k),
                }
            }
            ref k => panic!("Unexpected key: {:?}", k),
        }
        assert!(matches!(keys[1], SearchQuery::SequenceSet(..)));
    }

    #[test]
    fn search_errors() {
        assert!(matches!(
            search_keys("SEEN BOGUS"),
            Err(Error::BadSearchQuery(..))
        ));
        assert!(search_keys("").is_err());
        assert!(search_keys("SINCE 31-Feb-2020").is_err());
        assert!(search_keys("FROM").is_err());
        assert!(search_keys("0:3").is_err());
    }

    #[test]
    fn flag_lists() {
        assert_eq!(
            vec![Flag::Seen, Flag::Deleted, Flag::Keyword("$Junk".to_owned())],
            flag_list("(\\Seen \\deleted $Junk)").unwrap()
        );
        assert_eq!(vec![Flag::Flagged], flag_list("\\Flagged").unwrap());
        assert!(flag_list("()").unwrap().is_empty());
        assert!(matches!(flag_list("(\\Recent)"), Err(Error::NxFlag)));
    }

    #[test]
    fn status_item_lists() {
        assert_eq!(
            vec![StatusItem::Messages, StatusItem::UidNext],
            status_items("(MESSAGES uidnext)").unwrap()
        );
        assert_eq!(vec![StatusItem::Unseen], status_items("UNSEEN").unwrap());
        assert!(status_items("(SIZE)").is_err());
    }

    #[test]
    fn date_times() {
        assert_eq!(
            "2020-02-01T12:00:00+01:00",
            date_time("\" 1-Feb-2020 12:00:00 +0100\"")
                .unwrap()
                .to_rfc3339()
        );
        assert_eq!(
            "2021-12-24T23:59:59-05:00",
            date_time("24-Dec-2021 23:59:59 -0500").unwrap().to_rfc3339()
        );
        assert!(date_time("24-Dec-2021").is_err());
    }
}
