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

use std::fmt;
use std::io::{self, Write};
use std::thread;

use chrono::prelude::*;
use crossbeam::channel::{self, Receiver, Sender};
use log::{debug, error};

use super::defs::*;
use crate::account::model::*;
use crate::mime::fetch::bodystructure::{body_structure, BodyStructure};
use crate::mime::fetch::envelope::{envelope, Envelope};
use crate::mime::fetch::section::BodySection;
use crate::support::error::Error;
use crate::support::system_config::MailboxOptions;

/// One item of a `FETCH` response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchedItem {
    Envelope(Envelope),
    Flags(Vec<Flag>),
    InternalDate(DateTime<FixedOffset>),
    Rfc822Size(u32),
    Uid(Uid),
    Body(BodyStructure),
    BodyStructure(BodyStructure),
    Section(BodySection, Vec<u8>),
}

/// Everything fetched from one message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchedMessage {
    pub seqnum: Seqnum,
    pub uid: Uid,
    pub items: Vec<FetchedItem>,
}

impl FetchedMessage {
    /// Write this message as an untagged IMAP `FETCH` response.
    pub fn write_to(&self, out: &mut impl Write) -> io::Result<()> {
        write!(out, "* {} FETCH (", self.seqnum)?;
        for (ix, item) in self.items.iter().enumerate() {
            if 0 != ix {
                out.write_all(b" ")?;
            }

            match *item {
                FetchedItem::Section(ref section, ref data) => {
                    write!(out, "{} {{{}}}\r\n", section, data.len())?;
                    out.write_all(data)?;
                }
                ref item => write!(out, "{}", item)?,
            }
        }
        out.write_all(b")\r\n")
    }
}

/// Formats the item as it appears in a `FETCH` response.
///
/// Section content is binary, so it is written lossily here; use
/// `FetchedMessage::write_to()` for the real thing.
impl fmt::Display for FetchedItem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            FetchedItem::Envelope(ref e) => write!(f, "ENVELOPE {}", e),
            FetchedItem::Flags(ref flags) => {
                write!(f, "FLAGS (")?;
                for (ix, flag) in flags.iter().enumerate() {
                    if 0 != ix {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", flag)?;
                }
                write!(f, ")")
            }
            FetchedItem::InternalDate(ref date) => write!(
                f,
                "INTERNALDATE \"{}\"",
                date.format("%e-%b-%Y %H:%M:%S %z")
            ),
            FetchedItem::Rfc822Size(size) => write!(f, "RFC822.SIZE {}", size),
            FetchedItem::Uid(uid) => write!(f, "UID {}", uid),
            FetchedItem::Body(ref bs) => {
                write!(f, "BODY {}", bs.display(false))
            }
            FetchedItem::BodyStructure(ref bs) => {
                write!(f, "BODYSTRUCTURE {}", bs.display(true))
            }
            FetchedItem::Section(ref section, ref data) => write!(
                f,
                "{} {{{}}}\r\n{}",
                section,
                data.len(),
                String::from_utf8_lossy(data)
            ),
        }
    }
}

/// Resolve `items` against one message.
///
/// Items which can't be produced for this message, such as a body section
/// addressing a part that doesn't exist or the structure of a message that
/// can't be parsed, are left out of the result.
pub fn fetch_message(
    message: &Message,
    seqnum: Seqnum,
    uid: Uid,
    items: &[FetchItem],
    options: &MailboxOptions,
) -> FetchedMessage {
    let mut fetched = Vec::with_capacity(items.len());
    // Parsed lazily and at most once, since most fetches never need it
    let mut structure: Option<Result<BodyStructure, Error>> = None;

    for item in items {
        let result = match *item {
            FetchItem::Envelope => message
                .headers()
                .map(|headers| FetchedItem::Envelope(envelope(&headers))),
            FetchItem::Flags => Ok(FetchedItem::Flags(message.flags())),
            FetchItem::InternalDate => Ok(FetchedItem::InternalDate(
                message.internal_date(options.internal_date),
            )),
            FetchItem::Rfc822Size => Ok(FetchedItem::Rfc822Size(
                message.size(options.size_accounting),
            )),
            FetchItem::Uid => Ok(FetchedItem::Uid(uid)),
            FetchItem::Body | FetchItem::BodyStructure => {
                let bs = structure
                    .get_or_insert_with(|| body_structure(message.data()));
                match *bs {
                    Ok(ref bs) if FetchItem::Body == *item => {
                        Ok(FetchedItem::Body(bs.clone()))
                    }
                    Ok(ref bs) => Ok(FetchedItem::BodyStructure(bs.clone())),
                    Err(ref e) => {
                        debug!("No body structure for {}: {}", seqnum, e);
                        continue;
                    }
                }
            }
            FetchItem::Section(ref section) => {
                match section.fetch(message.data()) {
                    Ok(Some(data)) => {
                        Ok(FetchedItem::Section(section.clone(), data))
                    }
                    Ok(None) => {
                        debug!(
                            "Message {} has no section {}",
                            seqnum, section
                        );
                        continue;
                    }
                    Err(e) => Err(e),
                }
            }
        };

        match result {
            Ok(item) => fetched.push(item),
            Err(e) => debug!("Skipping fetch item for {}: {}", seqnum, e),
        }
    }

    FetchedMessage {
        seqnum,
        uid,
        items: fetched,
    }
}

impl Mailbox {
    /// The `FETCH` and `UID FETCH` commands.
    ///
    /// Every selected message with a usable UID is fetched and sent to
    /// `sender` in file order. `sender` is dropped once the listing is done,
    /// whether it succeeded or not, which closes the stream.
    ///
    /// If the receiving end goes away, the listing stops early and this
    /// returns success.
    pub fn list_messages(
        &mut self,
        is_uid: bool,
        ids: &SeqSet,
        items: &[FetchItem],
        sender: Sender<FetchedMessage>,
    ) -> Result<(), Error> {
        self.list_with(is_uid, ids, items, |m| sender.send(m).is_ok())
    }

    /// Like `list_messages()`, but run on a background thread.
    ///
    /// The thread works on its own read-only handle of the store, so this
    /// handle can be used for other things meanwhile. Results are delivered
    /// through a channel of `listing_buffer` capacity; an error which aborts
    /// the listing is delivered as the final item.
    pub fn spawn_listing(
        &self,
        is_uid: bool,
        ids: SeqSet,
        items: Vec<FetchItem>,
    ) -> Result<
        (
            Receiver<Result<FetchedMessage, Error>>,
            thread::JoinHandle<()>,
        ),
        Error,
    > {
        let mut mailbox =
            Mailbox::open(&self.path, true, self.options.clone())?;
        let (tx, rx) = channel::bounded(self.options.listing_buffer);

        let handle = thread::Builder::new()
            .name(format!("list-{}", self.name))
            .spawn(move || {
                let result = mailbox.list_with(is_uid, &ids, &items, |m| {
                    tx.send(Ok(m)).is_ok()
                });
                if let Err(e) = result {
                    error!("{} Listing failed: {}", mailbox.log_prefix(), e);
                    let _ = tx.send(Err(e));
                }
            })?;

        Ok((rx, handle))
    }

    fn list_with(
        &mut self,
        is_uid: bool,
        ids: &SeqSet,
        items: &[FetchItem],
        mut emit: impl FnMut(FetchedMessage) -> bool,
    ) -> Result<(), Error> {
        // RFC 3501 requires UID FETCH to include the UID
        let mut items = items.to_vec();
        if is_uid && !items.contains(&FetchItem::Uid) {
            items.insert(0, FetchItem::Uid);
        }

        let selection = Selection::resolve(&self.file, is_uid, ids)?;
        if selection.is_empty() {
            return Ok(());
        }

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

            if !selection.contains(seqnum, uid) {
                continue;
            }

            let fetched =
                fetch_message(&message, seqnum, uid, &items, &self.options);
            if !emit(fetched) {
                debug!("{} Listing abandoned by receiver", self.log_prefix());
                break;
            }
        }

        Ok(())
    }
}
