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

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};

use chrono::prelude::*;
use log::{info, warn};

use super::defs::*;
use super::flags::set_status;
use crate::account::model::*;
use crate::mbox::{delimiter_line, write_record, Record};
use crate::mime::header;
use crate::support::error::Error;
use crate::support::file_ops;

impl Mailbox {
    /// Append a new message to the end of the store.
    ///
    /// `literal` is the message as given by the client. Any `X-UID` or
    /// `X-Status` headers it carries are replaced; the new message gets the
    /// next free UID and the given flags. Keywords are silently dropped.
    ///
    /// The delimiter line records `date`, which becomes the internal date if
    /// the mailbox is configured to take it from there.
    ///
    /// This corresponds to the `APPEND` command from RFC 3501.
    pub fn create_message(
        &mut self,
        flags: &[Flag],
        date: DateTime<Utc>,
        literal: &[u8],
    ) -> Result<Uid, Error> {
        self.not_read_only()?;

        let record = Record {
            from_line: delimiter_line(&self.options.delimiter_sender, date),
            data: set_status(literal, flags)?,
            offset: 0,
        };

        let uids = self.append_records(vec![record])?;
        let uid = uids.first().copied().ok_or(Error::UidSpaceExhausted)?;
        info!("{} Appended message {}", self.log_prefix(), uid.0.get());
        Ok(uid)
    }

    /// Copy the selected messages to the end of `dest`.
    ///
    /// The copies keep their delimiter line and flags, but are given fresh
    /// UIDs in `dest`. Messages without a usable UID are not copied.
    ///
    /// Returns `(source_uid, dest_uid)` for every message copied, in source
    /// file order.
    ///
    /// This corresponds to the `COPY` and `UID COPY` commands.
    pub fn copy_messages(
        &mut self,
        is_uid: bool,
        ids: &SeqSet,
        dest: &mut Mailbox,
    ) -> Result<Vec<(Uid, Uid)>, Error> {
        dest.not_read_only()?;

        let selection = Selection::resolve(&self.file, is_uid, ids)?;
        if selection.is_empty() {
            return Ok(vec![]);
        }

        let mut source_uids = Vec::new();
        let mut records = Vec::new();
        for item in scan(&self.file)? {
            let (seqnum, message) = match item {
                Ok(m) => m,
                Err(e) if e.is_per_message() => continue,
                Err(e) => return Err(e),
            };

            match message.uid() {
                Ok(uid) if selection.contains(seqnum, uid) => {
                    source_uids.push(uid);
                    records.push(message.into_record());
                }
                _ => (),
            }
        }

        let dest_uids = dest.append_records(records)?;
        info!(
            "{} Copied {} message(s) to {}",
            self.log_prefix(),
            dest_uids.len(),
            dest.name
        );
        Ok(source_uids.into_iter().zip(dest_uids).collect())
    }

    /// Permanently remove every message flagged `\Deleted`.
    ///
    /// Returns the sequence numbers of the removed messages in the form the
    /// `EXPUNGE` response needs: each one is relative to the mailbox as it
    /// stands after all the preceding removals have taken effect.
    ///
    /// All sequence numbers obtained before this call are invalid afterwards.
    pub fn expunge(&mut self) -> Result<Vec<Seqnum>, Error> {
        self.not_read_only()?;

        let mut expunged = Vec::new();
        self.rewrite(|seqnum, message| {
            if !message.flags().contains(&Flag::Deleted) {
                return Ok(Some(message.into_record()));
            }

            let adjusted = u32::from(seqnum) - expunged.len() as u32;
            expunged.push(Seqnum::of(adjusted).unwrap_or(Seqnum::MIN));
            Ok(None)
        })?;

        info!(
            "{} Expunged {} message(s)",
            self.log_prefix(),
            expunged.len()
        );
        Ok(expunged)
    }

    /// Rebuild the whole store through `decide`.
    ///
    /// `decide` is called once for every message in file order and returns
    /// the record to write in its place, or `None` to drop it. Records which
    /// can't be decoded at all bypass `decide` and are carried over as-is.
    ///
    /// The new store is written to a temporary file and renamed over the old
    /// one, so if anything fails, including `decide`, the store is
    /// unchanged.
    pub(super) fn rewrite(
        &mut self,
        mut decide: impl FnMut(
            Seqnum,
            Message,
        ) -> Result<Option<Record>, Error>,
    ) -> Result<(), Error> {
        let records = scan_records(&self.file)?;
        let new_file = file_ops::replace_atomically(&self.path, |out| {
            let mut seqnum = Seqnum::MIN;
            for (ix, record) in records.enumerate() {
                if ix > 0 {
                    seqnum = seqnum.next();
                }

                let record = match Message::decode(record?) {
                    Ok(message) => match decide(seqnum, message)? {
                        Some(record) => record,
                        None => continue,
                    },
                    Err((e, record)) => {
                        warn!(
                            "Carrying over undecodable message at {}: {}",
                            record.offset, e
                        );
                        record
                    }
                };

                write_record(out, &record.from_line, &record.data)
                    .map_err(Error::Write)?;
            }

            Ok(())
        })
        .map_err(|e| match e {
            Error::Io(e) => Error::Write(e),
            e => e,
        })?;

        self.file = new_file;
        Ok(())
    }

    /// Write `records` to the end of the store, giving each one the next
    /// free UID.
    ///
    /// Either every record is appended or, as far as the filesystem allows,
    /// none is.
    fn append_records(
        &mut self,
        records: Vec<Record>,
    ) -> Result<Vec<Uid>, Error> {
        self.not_read_only()?;
        if records.is_empty() {
            return Ok(vec![]);
        }

        let mut max_uid = census(&self.file)?.max_uid;
        let original_len = self.file.metadata().map_err(Error::Write)?.len();

        let mut buffer = separator_for(&self.file, original_len)?.to_vec();
        let mut uids = Vec::with_capacity(records.len());
        for record in records {
            let uid = match max_uid {
                None => Uid::MIN,
                Some(max) => max.next().ok_or(Error::UidSpaceExhausted)?,
            };
            max_uid = Some(uid);

            let data =
                header::set_header(&record.data, "X-UID", &uid.to_string())?;
            write_record(&mut buffer, &record.from_line, &data)
                .map_err(Error::Write)?;
            uids.push(uid);
        }

        let result = self
            .file
            .seek(SeekFrom::End(0))
            .and_then(|_| self.file.write_all(&buffer))
            .and_then(|_| self.file.flush());
        if let Err(e) = result {
            if let Err(e2) = self.file.set_len(original_len) {
                warn!(
                    "{} Failed to roll back partial append: {}",
                    self.log_prefix(),
                    e2
                );
            }
            return Err(Error::Write(e));
        }

        Ok(uids)
    }
}

/// Returns what must be written before a new record so that the previous
/// record is properly terminated by a blank line.
fn separator_for(
    mut file: &File,
    len: u64,
) -> Result<&'static [u8], Error> {
    if 0 == len {
        return Ok(b"");
    }

    let tail_len = len.min(2);
    let mut tail = [0u8; 2];
    let tail = &mut tail[..tail_len as usize];
    file.seek(SeekFrom::Start(len - tail_len))
        .and_then(|_| file.read_exact(tail))
        .map_err(Error::Write)?;

    Ok(if tail.ends_with(b"\n\n") {
        b""
    } else if tail.ends_with(b"\n") {
        b"\n"
    } else {
        b"\n\n"
    })
}

#[cfg(test)]
mod test {
    use super::super::test_prelude::*;
    use super::*;
    use crate::test_data::*;

    fn date() -> DateTime<Utc> {
        Utc.ymd(2020, 3, 4).and_hms(5, 6, 7)
    }

    #[test]
    fn append_to_empty_store() {
        let mut setup = set_up(b"");
        let uid = setup
            .mailbox
            .create_message(
                &[Flag::Seen],
                date(),
                b"Subject: Hello\r\n\r\nHello world\r\n",
            )
            .unwrap();
        assert_eq!(Uid::u(1), uid);

        assert_eq!(
            "From MAILER-DAEMON Wed Mar  4 05:06:07 2020\n\
             Subject: Hello\n\
             X-Status: R\n\
             X-UID: 1\n\
             \n\
             Hello world\n\
             \n",
            setup.contents()
        );
    }

    #[test]
    fn append_assigns_next_uid_and_replaces_reserved_headers() {
        let mut setup = set_up(SCENARIO_MBOX);
        let uid = setup
            .mailbox
            .create_message(
                &[Flag::Flagged, Flag::Keyword("$Junk".to_owned())],
                date(),
                b"X-UID: 3\nX-Status: D\nSubject: Third\n\nFrom here on\n",
            )
            .unwrap();
        assert_eq!(Uid::u(10), uid);

        let contents = setup.contents();
        assert!(contents.ends_with(
            "Subject: Third\nX-Status: F\nX-UID: 10\n\n>From here on\n\n"
        ));
        assert!(!contents.contains("X-UID: 3"));

        let mut reopened = setup.reopen();
        assert_eq!(
            vec![Uid::u(5), Uid::u(9), Uid::u(10)],
            reopened.uid_search(&[SearchQuery::All]).unwrap()
        );
        assert_eq!(
            vec![Uid::u(10)],
            reopened.uid_search(&[SearchQuery::Flagged]).unwrap()
        );
    }

    #[test]
    fn append_terminates_unterminated_store() {
        let mut setup =
            set_up(b"From x Thu Jan  1 00:00:00 1970\nX-UID: 4\n\nhi");
        setup
            .mailbox
            .create_message(&[], date(), b"Subject: Next\n\nbody\n")
            .unwrap();

        let mut reopened = setup.reopen();
        assert_eq!(
            vec![Uid::u(4), Uid::u(5)],
            reopened.uid_search(&[SearchQuery::All]).unwrap()
        );
        assert!(setup.contents().contains("\nhi\n\nFrom MAILER-DAEMON"));
    }

    #[test]
    fn append_with_exhausted_uids() {
        let mut setup = set_up(
            b"From x Thu Jan  1 00:00:00 1970\nX-UID: 4294967295\n\nhi\n\n",
        );
        assert!(matches!(
            setup.mailbox.create_message(&[], date(), b"Subject: x\n\n"),
            Err(Error::UidSpaceExhausted)
        ));
        assert_eq!(1, setup.mailbox.status(&[]).unwrap().messages);
    }

    #[test]
    fn append_read_only() {
        let setup = set_up(SCENARIO_MBOX);
        let mut read_only = setup.reopen_read_only();
        assert!(matches!(
            read_only.create_message(&[], date(), b"Subject: x\n\n"),
            Err(Error::MailboxReadOnly)
        ));
    }

    #[test]
    fn expunge_reports_adjusted_seqnums() {
        let mut setup = set_up(
            b"From a Thu Jan  1 00:00:00 1970\nX-UID: 1\nX-Status: D\n\n1\n\n\
              From b Thu Jan  1 00:00:00 1970\nX-UID: 2\n\n2\n\n\
              From c Thu Jan  1 00:00:00 1970\nX-UID: 3\nX-Status: RD\n\n3\n\n\
              From d Thu Jan  1 00:00:00 1970\nX-UID: 4\nX-Status: D\n\n4\n\n\
              From e Thu Jan  1 00:00:00 1970\nX-UID: 5\n\n5\n\n",
        );

        assert_eq!(
            vec![Seqnum::u(1), Seqnum::u(2), Seqnum::u(2)],
            setup.mailbox.expunge().unwrap()
        );
        assert_eq!(
            vec![Uid::u(2), Uid::u(5)],
            setup.mailbox.uid_search(&[SearchQuery::All]).unwrap()
        );

        let mut reopened = setup.reopen();
        assert_eq!(2, reopened.status(&[]).unwrap().messages);
        assert!(reopened.expunge().unwrap().is_empty());
    }

    #[test]
    fn expunge_scenario() {
        let mut setup = set_up(SCENARIO_MBOX);
        assert_eq!(vec![Seqnum::u(2)], setup.mailbox.expunge().unwrap());

        let contents = setup.contents();
        assert!(contents.contains("Subject: First message"));
        assert!(!contents.contains("Subject: Second message"));
    }

    #[test]
    fn rewrite_normalises_crlf_store() {
        let mut setup = set_up(
            b"From a Thu Jan  1 00:00:00 1970\r\n\
              X-UID: 1\r\n\
              X-Status: D\r\n\
              \r\n\
              one\r\n\
              \r\n\
              From b Thu Jan  1 00:00:00 1970\r\n\
              X-UID: 7\r\n\
              \r\n\
              two\r\n\
              \r\n",
        );
        assert_eq!(vec![Seqnum::u(1)], setup.mailbox.expunge().unwrap());
        assert_eq!(
            "From b Thu Jan  1 00:00:00 1970\nX-UID: 7\n\ntwo\n\n",
            setup.contents()
        );
    }

    #[test]
    fn copy_assigns_fresh_uids() {
        let mut source = set_up(SCENARIO_MBOX);
        let mut dest = set_up(NO_UID_MBOX);

        let copied = source
            .mailbox
            .copy_messages(false, &"1:*".parse().unwrap(), &mut dest.mailbox)
            .unwrap();
        assert_eq!(
            vec![(Uid::u(5), Uid::u(3)), (Uid::u(9), Uid::u(4))],
            copied
        );

        assert_eq!(
            vec![Uid::u(1), Uid::u(2), Uid::u(3), Uid::u(4)],
            dest.mailbox.uid_search(&[SearchQuery::All]).unwrap()
        );
        assert_eq!(
            vec![Uid::u(4)],
            dest.mailbox.uid_search(&[SearchQuery::Deleted]).unwrap()
        );
        assert_eq!(
            vec![Seqnum::u(4)],
            dest.mailbox
                .seqnum_search(&[SearchQuery::Subject("First".to_owned())])
                .unwrap()
        );

        // The source is untouched
        assert_eq!(SCENARIO_MBOX, source.contents().as_bytes());
    }

    #[test]
    fn copy_by_uid_ignores_missing() {
        let mut source = set_up(SCENARIO_MBOX);
        let mut dest = set_up(b"");

        let copied = source
            .mailbox
            .copy_messages(true, &"6:9,20".parse().unwrap(), &mut dest.mailbox)
            .unwrap();
        assert_eq!(vec![(Uid::u(9), Uid::u(1))], copied);

        let copied = source
            .mailbox
            .copy_messages(true, &"20".parse().unwrap(), &mut dest.mailbox)
            .unwrap();
        assert!(copied.is_empty());
    }

    #[test]
    fn rewrite_carries_over_messages_without_uid() {
        let mut setup = set_up(NO_UID_MBOX);
        setup.mailbox.rewrite(|_, m| Ok(Some(m.into_record()))).unwrap();
        assert_eq!(NO_UID_MBOX, setup.contents().as_bytes());
    }

    #[test]
    fn failed_rewrite_leaves_store() {
        let mut setup = set_up(SCENARIO_MBOX);
        let result = setup.mailbox.rewrite(|seqnum, m| {
            if Seqnum::u(2) == seqnum {
                Err(Error::UidSpaceExhausted)
            } else {
                Ok(Some(m.into_record()))
            }
        });
        assert!(matches!(result, Err(Error::UidSpaceExhausted)));
        assert_eq!(SCENARIO_MBOX, setup.contents().as_bytes());
    }
}
