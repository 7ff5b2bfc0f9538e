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

//! Constants from `sysexits.h`
//!
//! The CLI uses these so that scripts driving it (e.g. from procmail) can tell
//! a bad invocation from a damaged store.

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Sysexit(pub i32);

pub const EX_OK: Sysexit = Sysexit(0);
pub const EX_USAGE: Sysexit = Sysexit(64);
pub const EX_DATAERR: Sysexit = Sysexit(65);
pub const EX_NOINPUT: Sysexit = Sysexit(66);
pub const EX_SOFTWARE: Sysexit = Sysexit(70);
pub const EX_CANTCREAT: Sysexit = Sysexit(73);
pub const EX_IOERR: Sysexit = Sysexit(74);
pub const EX_NOPERM: Sysexit = Sysexit(77);
pub const EX_CONFIG: Sysexit = Sysexit(78);

impl Sysexit {
    pub fn exit(self) -> ! {
        std::process::exit(self.0)
    }
}

impl From<&crate::support::error::Error> for Sysexit {
    fn from(e: &crate::support::error::Error) -> Self {
        use crate::support::error::Error;

        match *e {
            Error::MailboxReadOnly => EX_NOPERM,
            Error::NxFlag
            | Error::UnsafeName
            | Error::BadSequenceSet
            | Error::BadSearchQuery(..)
            | Error::Syntax(..) => EX_USAGE,
            Error::BadUid
            | Error::MessageParse(..)
            | Error::Predicate(..)
            | Error::MalformedStore(..) => EX_DATAERR,
            Error::Scan(..) | Error::Write(..) | Error::Io(..) => EX_IOERR,
            Error::UidSpaceExhausted => EX_SOFTWARE,
            Error::Config(..) => EX_CONFIG,
        }
    }
}
