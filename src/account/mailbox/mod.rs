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

//! Support for working with a single mailbox.
//!
//! A mailbox is a single mbox store (see `crate::mbox`) with two reserved
//! headers layered on top of it:
//!
//! - `X-UID`. The UID of the message, in decimal. A message without a valid
//!   `X-UID` still occupies a sequence number, but is otherwise invisible:
//!   it can't be fetched, searched, flagged, or copied. It is carried over
//!   untouched by rewrites.
//!
//! - `X-Status`. The flags of the message; see `flags`.
//!
//! The UID validity is always 1. UIDs are assigned on append as one more
//! than the largest UID in the store, so a UID is never reused unless the
//! message holding the maximum is expunged.
//!
//! Sequence numbers are simply the position of a record in the file and are
//! never stored anywhere.
//!
//! Nothing is cached. Each operation scans the store from the start, so two
//! operations only agree with each other if nothing else modified the store
//! in between. Modifications other than appends rewrite the whole store into
//! a temporary file which then replaces the original, so a reader that
//! opened the store earlier keeps seeing the old content until it reopens
//! it.
//!
//! There is no locking against other processes modifying the store.

use std::fs::{File, OpenOptions};
use std::path::Path;

use log::info;

use crate::account::model::*;
use crate::support::error::Error;
use crate::support::system_config::MailboxOptions;

mod defs;
mod fetch;
mod flags;
mod messages;
mod search;
mod search_backend;
#[cfg(test)]
mod test_prelude;

pub use self::defs::{
    census, next_uid, scan, Census, Mailbox, Message, MessageScanner,
};
pub use self::fetch::{fetch_message, FetchedItem, FetchedMessage};
pub use self::flags::{decode_flags, encode_flags};

impl Mailbox {
    /// Open the store at `path`.
    ///
    /// The store must already exist. The name of the mailbox is the file
    /// name of `path` without its extension.
    pub fn open(
        path: &Path,
        read_only: bool,
        options: MailboxOptions,
    ) -> Result<Self, Error> {
        let file = OpenOptions::new()
            .read(true)
            .write(!read_only)
            .open(path)?;
        Ok(Self::with_file(path, file, read_only, options))
    }

    /// Create a new, empty store at `path` and open it read-write.
    ///
    /// Fails if something already exists at `path`.
    pub fn create(path: &Path, options: MailboxOptions) -> Result<Self, Error> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)?;
        let mailbox = Self::with_file(path, file, false, options);
        info!("{} Created mailbox", mailbox.log_prefix);
        Ok(mailbox)
    }

    fn with_file(
        path: &Path,
        file: File,
        read_only: bool,
        options: MailboxOptions,
    ) -> Self {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "INBOX".to_owned());

        Mailbox {
            log_prefix: format!("mbox:{}", name),
            name,
            path: path.to_owned(),
            file,
            read_only,
            subscribed: true,
            options,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return the log prefix used for messages regarding this mailbox.
    pub fn log_prefix(&self) -> &str {
        &self.log_prefix
    }

    /// Return whether this mailbox is opened read-only.
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn not_read_only(&self) -> Result<(), Error> {
        if self.read_only {
            Err(Error::MailboxReadOnly)
        } else {
            Ok(())
        }
    }

    /// Return what a `LIST` response reports about this mailbox.
    pub fn info(&self) -> MailboxInfo {
        let mut attributes = vec![MailboxAttribute::Noinferiors];
        if self.subscribed {
            attributes.push(MailboxAttribute::Subscribed);
        }

        MailboxInfo {
            name: self.name.clone(),
            delimiter: None,
            attributes,
        }
    }

    /// Mark the mailbox as subscribed.
    ///
    /// Subscriptions only live as long as this handle.
    pub fn subscribe(&mut self) {
        self.subscribed = true;
    }

    pub fn unsubscribe(&mut self) {
        self.subscribed = false;
    }

    /// The `CHECK` command.
    ///
    /// Flushes everything written to the store so far to stable storage.
    pub fn check(&mut self) -> Result<(), Error> {
        self.file.sync_all().map_err(Error::Write)
    }

    /// The `STATUS` command.
    ///
    /// Everything is computed regardless of `items`, since it all comes from
    /// the same scan anyway.
    pub fn status(
        &mut self,
        items: &[StatusItem],
    ) -> Result<MailboxStatus, Error> {
        let census = census(&self.file)?;
        Ok(MailboxStatus {
            name: self.name.clone(),
            items: items.to_vec(),
            messages: census.messages,
            recent: 0,
            uid_next: next_uid(census.max_uid),
            uid_validity: UID_VALIDITY,
            unseen: census.unseen,
            first_unseen: census.first_unseen,
            read_only: self.read_only,
            permanent_flags: Flag::permanent(),
        })
    }

    /// Scan the store from the start.
    ///
    /// Every record gets a sequence number, whether it can be decoded or
    /// not; see `MessageScanner`.
    pub fn scan(&mut self) -> Result<MessageScanner<&File>, Error> {
        scan(&self.file)
    }
}

#[cfg(test)]
mod test {
    use std::fs;

    use tempfile::TempDir;

    use super::test_prelude::*;
    use super::*;
    use crate::test_data::*;

    #[test]
    fn scenario_status() {
        let mut setup = set_up(SCENARIO_MBOX);
        let status = setup
            .mailbox
            .status(&[StatusItem::Messages, StatusItem::UidNext])
            .unwrap();

        assert_eq!("INBOX", status.name);
        assert_eq!(
            vec![StatusItem::Messages, StatusItem::UidNext],
            status.items
        );
        assert_eq!(2, status.messages);
        assert_eq!(0, status.recent);
        assert_eq!(Uid::u(10), status.uid_next);
        assert_eq!(1, status.uid_validity);
        assert_eq!(1, status.unseen);
        assert_eq!(Some(Seqnum::u(2)), status.first_unseen);
        assert!(!status.read_only);
        assert_eq!(Flag::permanent(), status.permanent_flags);
    }

    #[test]
    fn status_counts_messages_without_uid() {
        let mut setup = set_up(NO_UID_MBOX);
        let status = setup.mailbox.status(&[]).unwrap();
        assert_eq!(3, status.messages);
        assert_eq!(Uid::u(3), status.uid_next);
        assert_eq!(3, status.unseen);
        assert_eq!(Some(Seqnum::u(1)), status.first_unseen);
    }

    #[test]
    fn empty_store_status() {
        let mut setup = set_up(b"");
        let status = setup.mailbox.status(&[]).unwrap();
        assert_eq!(0, status.messages);
        assert_eq!(Uid::MIN, status.uid_next);
        assert_eq!(None, status.first_unseen);
    }

    #[test]
    fn scan_assigns_every_seqnum() {
        let mut setup = set_up(NO_UID_MBOX);
        let scanned = setup
            .mailbox
            .scan()
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        assert_eq!(
            vec![Seqnum::u(1), Seqnum::u(2), Seqnum::u(3)],
            scanned.iter().map(|&(s, _)| s).collect::<Vec<_>>()
        );
        assert_eq!(Uid::u(1), scanned[0].1.uid().unwrap());
        assert!(matches!(scanned[1].1.uid(), Err(Error::BadUid)));
        assert_eq!(Uid::u(2), scanned[2].1.uid().unwrap());
    }

    #[test]
    fn malformed_store_aborts() {
        let mut setup = set_up(b"Subject: not an mbox\n\nhi\n");
        assert!(matches!(
            setup.mailbox.status(&[]),
            Err(Error::MalformedStore(0))
        ));
        assert!(matches!(
            setup.mailbox.uid_search(&[SearchQuery::All]),
            Err(Error::MalformedStore(0))
        ));
    }

    #[test]
    fn info_and_subscriptions() {
        let mut setup = set_up(SCENARIO_MBOX);
        assert_eq!(
            MailboxInfo {
                name: "INBOX".to_owned(),
                delimiter: None,
                attributes: vec![
                    MailboxAttribute::Noinferiors,
                    MailboxAttribute::Subscribed,
                ],
            },
            setup.mailbox.info()
        );

        setup.mailbox.unsubscribe();
        assert_eq!(
            vec![MailboxAttribute::Noinferiors],
            setup.mailbox.info().attributes
        );
        setup.mailbox.subscribe();
        assert_eq!(2, setup.mailbox.info().attributes.len());
    }

    #[test]
    fn create_then_append_and_check() {
        let root = TempDir::new().unwrap();
        let path = root.path().join("Archive.mbox");
        let mut mailbox =
            Mailbox::create(&path, MailboxOptions::default()).unwrap();
        assert_eq!("Archive", mailbox.name());
        assert!(Mailbox::create(&path, MailboxOptions::default()).is_err());

        let uid = mailbox
            .create_message(
                &[Flag::Seen],
                chrono::Utc::now(),
                b"Subject: Saved\n\nkeep me\n",
            )
            .unwrap();
        assert_eq!(Uid::u(1), uid);
        mailbox.check().unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("X-Status: R\n"));
        assert!(content.contains("X-UID: 1\n"));
    }

    #[test]
    fn read_only_status_and_check() {
        let setup = set_up(SCENARIO_MBOX);
        let mut read_only = setup.reopen_read_only();
        assert!(read_only.is_read_only());
        assert!(read_only.status(&[]).unwrap().read_only);
        read_only.check().unwrap();
    }
}
