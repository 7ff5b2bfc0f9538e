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

use std::io;

use thiserror::Error;

/// Everything that can go wrong in Mboxmap.
///
/// The variants fall into two groups. Errors concerning a single message
/// (`BadUid`, `MessageParse`, `Predicate`) are recovered from locally by
/// skipping that message; see `is_per_message()`. Everything else aborts the
/// operation in progress.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Mailbox is read-only")]
    MailboxReadOnly,
    #[error("Non-existent flag")]
    NxFlag,
    #[error("Unsafe flag or mailbox name")]
    UnsafeName,
    #[error("Invalid sequence set")]
    BadSequenceSet,
    #[error("Invalid search query: {0}")]
    BadSearchQuery(String),
    #[error("Syntax error: {0}")]
    Syntax(String),
    #[error("Missing or invalid X-UID header")]
    BadUid,
    #[error("Unable to parse message: {0}")]
    MessageParse(#[from] mailparse::MailParseError),
    #[error("Search predicate failed: {0}")]
    Predicate(String),
    #[error("mbox store is malformed at offset {0}")]
    MalformedStore(u64),
    #[error("Error scanning mbox store: {0}")]
    Scan(#[source] io::Error),
    #[error("Error writing mbox store: {0}")]
    Write(#[source] io::Error),
    #[error("UID space exhausted")]
    UidSpaceExhausted,
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Config(#[from] toml::de::Error),
}

impl Error {
    /// Returns whether this error concerns only a single message and should
    /// cause that message to be skipped instead of aborting the operation.
    pub fn is_per_message(&self) -> bool {
        matches!(
            *self,
            Error::BadUid | Error::MessageParse(..) | Error::Predicate(..)
        )
    }
}
