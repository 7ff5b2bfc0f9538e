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

//! The `X-Status` flag codec, and the `STORE` operation built on it.
//!
//! `X-Status` holds one letter per flag:
//!
//! | Code | Flag        |
//! |------|-------------|
//! | `A`  | `\Answered` |
//! | `F`  | `\Flagged`  |
//! | `T`  | `\Draft`    |
//! | `D`  | `\Deleted`  |
//! | `R`  | `\Seen`     |
//!
//! Codes are read case-insensitively. Anything else in the header is ignored,
//! and keywords have no code, so they can't be stored.

use log::info;

use super::defs::*;
use crate::account::model::*;
use crate::mime::header;
use crate::support::error::Error;

fn flag_code(flag: &Flag) -> Option<char> {
    match *flag {
        Flag::Answered => Some('A'),
        Flag::Flagged => Some('F'),
        Flag::Draft => Some('T'),
        Flag::Deleted => Some('D'),
        Flag::Seen => Some('R'),
        Flag::Keyword(..) => None,
    }
}

/// Decode the value of an `X-Status` header.
///
/// Each flag appears at most once in the result, in the order of its first
/// code.
pub fn decode_flags(status: &str) -> Vec<Flag> {
    let mut flags = Vec::new();
    for ch in status.chars() {
        let flag = match ch.to_ascii_uppercase() {
            'A' => Flag::Answered,
            'F' => Flag::Flagged,
            'T' => Flag::Draft,
            'D' => Flag::Deleted,
            'R' => Flag::Seen,
            _ => continue,
        };

        if !flags.contains(&flag) {
            flags.push(flag);
        }
    }
    flags
}

/// Encode `flags` for the `X-Status` header.
///
/// Codes are emitted in the order given, duplicates included. Keywords are
/// silently dropped.
pub fn encode_flags(flags: &[Flag]) -> String {
    flags.iter().filter_map(flag_code).collect()
}

/// Rewrite the `X-Status` header of `data` to hold exactly `flags`.
///
/// If there are no flags to store, the header is removed.
pub(super) fn set_status(
    data: &[u8],
    flags: &[Flag],
) -> Result<Vec<u8>, Error> {
    let status = encode_flags(flags);
    if status.is_empty() {
        header::remove_header(data, "X-Status")
    } else {
        header::set_header(data, "X-Status", &status)
    }
}

fn apply_flags_op(
    mut current: Vec<Flag>,
    op: FlagsOp,
    flags: &[Flag],
) -> Vec<Flag> {
    if FlagsOp::Remove == op {
        current.retain(|f| !flags.contains(f));
        return current;
    }

    if FlagsOp::Set == op {
        current.clear();
    }

    for flag in flags {
        if flag_code(flag).is_some() && !current.contains(flag) {
            current.push(flag.clone());
        }
    }
    current
}

impl Mailbox {
    /// The `STORE` and `UID STORE` operations.
    ///
    /// `ids` is interpreted as UIDs if `is_uid` is true and as sequence
    /// numbers otherwise. Messages without a usable UID are never touched.
    ///
    /// The store is rewritten as a whole, so this is atomic: either every
    /// selected message gets its new flags, or the store is unchanged.
    ///
    /// Returns the resulting flags of every selected message, in file order.
    pub fn update_messages_flags(
        &mut self,
        is_uid: bool,
        ids: &SeqSet,
        op: FlagsOp,
        flags: &[Flag],
    ) -> Result<Vec<UpdatedFlags>, Error> {
        self.not_read_only()?;

        let selection = Selection::resolve(&self.file, is_uid, ids)?;
        if selection.is_empty() {
            return Ok(vec![]);
        }

        let mut updated = Vec::new();
        self.rewrite(|seqnum, message| {
            let uid = match message.uid() {
                Ok(uid) if selection.contains(seqnum, uid) => uid,
                _ => return Ok(Some(message.into_record())),
            };

            let new_flags = apply_flags_op(message.flags(), op, flags);
            let mut record = message.into_record();
            record.data = set_status(&record.data, &new_flags)?;
            updated.push(UpdatedFlags {
                seqnum,
                uid,
                flags: new_flags,
            });
            Ok(Some(record))
        })?;

        info!(
            "{} Updated flags on {} message(s)",
            self.log_prefix(),
            updated.len()
        );
        Ok(updated)
    }
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::super::test_prelude::*;
    use super::*;
    use crate::test_data::*;

    #[test]
    fn decode_status_codes() {
        assert_eq!(
            vec![Flag::Seen, Flag::Answered],
            decode_flags("RA")
        );
        assert_eq!(
            vec![Flag::Flagged, Flag::Draft, Flag::Deleted],
            decode_flags("ftd")
        );
        assert_eq!(vec![Flag::Seen], decode_flags("R?O R"));
        assert!(decode_flags("").is_empty());
        assert!(decode_flags("XYZ").is_empty());
    }

    #[test]
    fn encode_status_codes() {
        assert_eq!("R", encode_flags(&[Flag::Seen]));
        assert_eq!(
            "DAA",
            encode_flags(&[
                Flag::Deleted,
                Flag::Answered,
                Flag::Keyword("$Junk".to_owned()),
                Flag::Answered,
            ])
        );
        assert_eq!("", encode_flags(&[]));
    }

    proptest! {
        #[test]
        fn codec_round_trip(mask in 0u32..32) {
            let all = Flag::permanent();
            let subset: Vec<Flag> = all
                .iter()
                .enumerate()
                .filter(|&(ix, _)| 0 != mask & (1 << ix))
                .map(|(_, f)| f.clone())
                .collect();

            let decoded = decode_flags(&encode_flags(&subset));
            prop_assert_eq!(subset.len(), decoded.len());
            for flag in &subset {
                prop_assert!(decoded.contains(flag));
            }
        }
    }

    #[test]
    fn flags_ops() {
        let current = vec![Flag::Seen, Flag::Answered];
        assert_eq!(
            vec![Flag::Deleted],
            apply_flags_op(current.clone(), FlagsOp::Set, &[Flag::Deleted])
        );
        assert_eq!(
            vec![Flag::Seen, Flag::Answered, Flag::Flagged],
            apply_flags_op(
                current.clone(),
                FlagsOp::Add,
                &[Flag::Seen, Flag::Flagged, Flag::Keyword("x".to_owned())]
            )
        );
        assert_eq!(
            vec![Flag::Answered],
            apply_flags_op(current, FlagsOp::Remove, &[Flag::Seen])
        );
    }

    #[test]
    fn update_flags_by_uid_persists() {
        let mut setup = set_up(SCENARIO_MBOX);

        let updated = setup
            .mailbox
            .update_messages_flags(
                true,
                &"9".parse().unwrap(),
                FlagsOp::Add,
                &[Flag::Flagged],
            )
            .unwrap();
        assert_eq!(
            vec![UpdatedFlags {
                seqnum: Seqnum::u(2),
                uid: Uid::u(9),
                flags: vec![Flag::Deleted, Flag::Flagged],
            }],
            updated
        );

        let mut reopened = setup.reopen();
        assert_eq!(
            vec![Uid::u(9)],
            reopened.uid_search(&[SearchQuery::Flagged]).unwrap()
        );
        assert_eq!(
            vec![Uid::u(5)],
            reopened.uid_search(&[SearchQuery::Unflagged]).unwrap()
        );
        assert!(setup.contents().contains("X-Status: DF\n"));
    }

    #[test]
    fn update_flags_by_seqnum_skips_messages_without_uid() {
        let mut setup = set_up(NO_UID_MBOX);

        let updated = setup
            .mailbox
            .update_messages_flags(
                false,
                &"1:*".parse().unwrap(),
                FlagsOp::Set,
                &[Flag::Seen],
            )
            .unwrap();
        assert_eq!(
            vec![(Seqnum::u(1), Uid::u(1)), (Seqnum::u(3), Uid::u(2))],
            updated
                .iter()
                .map(|u| (u.seqnum, u.uid))
                .collect::<Vec<_>>()
        );

        let contents = setup.contents();
        assert_eq!(2, contents.matches("X-Status: R\n").count());
        assert!(contents.contains("Subject: Written by another program\n"));
        assert_eq!(3, setup.mailbox.status(&[]).unwrap().messages);
    }

    #[test]
    fn clearing_flags_removes_header() {
        let mut setup = set_up(SCENARIO_MBOX);
        setup
            .mailbox
            .update_messages_flags(
                false,
                &"1".parse().unwrap(),
                FlagsOp::Remove,
                &[Flag::Seen, Flag::Answered],
            )
            .unwrap();

        let contents = setup.contents();
        assert!(!contents.contains("X-Status: RA"));
        assert_eq!(1, contents.matches("X-Status:").count());
    }

    #[test]
    fn update_flags_read_only() {
        let setup = set_up(SCENARIO_MBOX);
        let mut read_only = setup.reopen_read_only();
        assert!(matches!(
            read_only.update_messages_flags(
                false,
                &SeqSet::all(),
                FlagsOp::Add,
                &[Flag::Seen],
            ),
            Err(Error::MailboxReadOnly)
        ));
    }
}
