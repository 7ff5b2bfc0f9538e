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
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::PathBuf;

use chrono::prelude::*;
use log::debug;
use mailparse::{MailHeader, MailHeaderMap, ParsedMail};

use super::flags::decode_flags;
use crate::account::model::*;
use crate::mbox::{Record, Scanner};
use crate::mime::{crlf_len, header};
use crate::support::error::Error;
use crate::support::system_config::{
    InternalDateSource, MailboxOptions, SizeAccounting,
};

/// A handle on a single mbox store, presented as an IMAP mailbox.
///
/// Every operation takes `&mut self`, so a handle serialises everything done
/// through it. Nothing is cached between operations; each one rescans the
/// store from the start.
pub struct Mailbox {
    pub(super) log_prefix: String,
    pub(super) name: String,
    pub(super) path: PathBuf,
    pub(super) file: File,
    pub(super) read_only: bool,
    pub(super) subscribed: bool,
    pub(super) options: MailboxOptions,
}

/// A record of the store decoded far enough to know its identity and flags.
#[derive(Clone, Debug)]
pub struct Message {
    record: Record,
    body_offset: usize,
    x_uid: Option<String>,
    x_status: Option<String>,
}

impl Message {
    pub fn from_record(record: Record) -> Result<Self, Error> {
        Self::decode(record).map_err(|(e, _)| e)
    }

    /// Like `from_record()`, but hands the record back on failure.
    pub(super) fn decode(record: Record) -> Result<Self, (Error, Record)> {
        let decoded =
            mailparse::parse_headers(&record.data).map(|(headers, offset)| {
                (
                    headers.get_first_value("X-UID"),
                    headers.get_first_value("X-Status"),
                    offset,
                )
            });

        match decoded {
            Ok((x_uid, x_status, body_offset)) => Ok(Message {
                record,
                body_offset,
                x_uid,
                x_status,
            }),
            Err(e) => Err((e.into(), record)),
        }
    }

    /// Return the UID of this message, as stored in `X-UID`.
    ///
    /// Fails with `Error::BadUid` if the header is missing or is not a
    /// non-zero 32-bit decimal number.
    pub fn uid(&self) -> Result<Uid, Error> {
        self.x_uid
            .as_ref()
            .and_then(|v| v.trim().parse::<u32>().ok())
            .and_then(Uid::of)
            .ok_or(Error::BadUid)
    }

    /// Return the flags of this message, as stored in `X-Status`.
    pub fn flags(&self) -> Vec<Flag> {
        self.x_status
            .as_deref()
            .map(decode_flags)
            .unwrap_or_default()
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn into_record(self) -> Record {
        self.record
    }

    /// The full message, headers included.
    pub fn data(&self) -> &[u8] {
        &self.record.data
    }

    pub fn body(&self) -> &[u8] {
        &self.record.data[self.body_offset..]
    }

    /// Re-parse the header block.
    pub fn headers(&self) -> Result<Vec<MailHeader<'_>>, Error> {
        let (headers, _) = mailparse::parse_headers(&self.record.data)?;
        Ok(headers)
    }

    /// Parse the whole message.
    pub fn parse(&self) -> Result<ParsedMail<'_>, Error> {
        Ok(mailparse::parse_mail(&self.record.data)?)
    }

    /// Return the size of this message for `RFC822.SIZE` and size searches.
    pub fn size(&self, accounting: SizeAccounting) -> u32 {
        let size = match accounting {
            SizeAccounting::Full => crlf_len(self.data()),
            SizeAccounting::Body => self.body().len(),
        };
        if size > u32::MAX as usize {
            u32::MAX
        } else {
            size as u32
        }
    }

    /// Return the internal date of this message.
    ///
    /// If the chosen source is missing or unintelligible, this is the UNIX
    /// epoch.
    pub fn internal_date(
        &self,
        source: InternalDateSource,
    ) -> DateTime<FixedOffset> {
        let date = match source {
            InternalDateSource::DateHeader => self
                .headers()
                .ok()
                .and_then(|h| h.get_first_value("Date"))
                .and_then(|v| header::parse_datetime(&v)),
            InternalDateSource::Delimiter => self
                .record
                .delimiter_date()
                .map(|d| d.with_timezone(&FixedOffset::east(0))),
        };

        date.unwrap_or_else(|| FixedOffset::east(0).timestamp(0, 0))
    }
}

/// Return the UID to be assigned to the next new message, given the largest
/// UID currently in the store.
pub fn next_uid(current_max: Option<Uid>) -> Uid {
    current_max.map_or(Uid::MIN, Uid::saturating_next)
}

/// Iterates the messages of a store in file order, assigning sequence
/// numbers.
///
/// Every record consumes a sequence number. A record which can't be decoded
/// at all is returned as a per-message error (see `Error::is_per_message()`)
/// so that the caller can skip it without losing count.
pub struct MessageScanner<R> {
    records: Scanner<BufReader<R>>,
    seqnum: u32,
}

impl<R: Read> Iterator for MessageScanner<R> {
    type Item = Result<(Seqnum, Message), Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.records.next()? {
            Ok(record) => record,
            Err(e) => return Some(Err(e)),
        };

        self.seqnum = self.seqnum.saturating_add(1);
        let seqnum = Seqnum::of(self.seqnum).unwrap_or(Seqnum::MAX);
        Some(Message::from_record(record).map(|m| (seqnum, m)))
    }
}

/// Start a scan of the store behind `reader` from the beginning.
pub fn scan<R: Read + Seek>(reader: R) -> Result<MessageScanner<R>, Error> {
    Ok(MessageScanner {
        records: scan_records(reader)?,
        seqnum: 0,
    })
}

/// Start a scan of the raw records of the store behind `reader` from the
/// beginning.
///
/// Rewrites use this so that records which can't be decoded are carried over
/// untouched.
pub fn scan_records<R: Read + Seek>(
    mut reader: R,
) -> Result<Scanner<BufReader<R>>, Error> {
    reader.seek(SeekFrom::Start(0)).map_err(Error::Scan)?;
    Ok(Scanner::new(BufReader::new(reader)))
}

/// Summary information gathered by one scan of the store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Census {
    /// The number of records, including those without a usable UID.
    pub messages: usize,
    pub max_uid: Option<Uid>,
    pub unseen: usize,
    pub first_unseen: Option<Seqnum>,
}

pub fn census<R: Read + Seek>(reader: R) -> Result<Census, Error> {
    let mut census = Census::default();
    for item in scan(reader)? {
        let (seqnum, message) = match item {
            Ok(m) => m,
            Err(e) if e.is_per_message() => {
                debug!("Counting undecodable message: {}", e);
                census.messages += 1;
                continue;
            }
            Err(e) => return Err(e),
        };

        census.messages += 1;
        if let Ok(uid) = message.uid() {
            census.max_uid = census.max_uid.max(Some(uid));
        }
        if !message.flags().contains(&Flag::Seen) {
            census.unseen += 1;
            census.first_unseen.get_or_insert(seqnum);
        }
    }

    Ok(census)
}

/// A resolved set of messages, addressed either by sequence number or by
/// UID.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selection {
    Seqnums(SeqRange<Seqnum>),
    Uids(SeqRange<Uid>),
}

impl Selection {
    /// Resolve `ids` against the store behind `reader`.
    ///
    /// The store is only scanned if `ids` uses `*`.
    pub fn resolve<R: Read + Seek>(
        reader: R,
        is_uid: bool,
        ids: &SeqSet,
    ) -> Result<Self, Error> {
        let splat = if ids.has_star() {
            let census = census(reader)?;
            if is_uid {
                census.max_uid.map_or(0, u32::from)
            } else {
                u32::try_from(census.messages).unwrap_or(u32::MAX)
            }
        } else {
            0
        };

        Ok(if is_uid {
            Selection::Uids(ids.resolve(splat))
        } else {
            Selection::Seqnums(ids.resolve(splat))
        })
    }

    pub fn contains(&self, seqnum: Seqnum, uid: Uid) -> bool {
        match *self {
            Selection::Seqnums(ref r) => r.contains(seqnum),
            Selection::Uids(ref r) => r.contains(uid),
        }
    }

    pub fn is_empty(&self) -> bool {
        match *self {
            Selection::Seqnums(ref r) => r.is_empty(),
            Selection::Uids(ref r) => r.is_empty(),
        }
    }
}
