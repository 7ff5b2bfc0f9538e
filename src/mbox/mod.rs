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

//! The on-disk mbox store.
//!
//! A store is a single file of concatenated records. Each record starts with a
//! delimiter line of the form
//!
//! ```text
//! From sender Thu Jan  1 00:00:00 1970
//! ```
//!
//! and ends with a blank line. A `From ` line only counts as a delimiter at
//! the very start of the file or directly after a blank line.
//!
//! Lines within a message which would be mistaken for a delimiter are quoted
//! in the "mboxrd" style: any line matching `^>*From ` gets one extra `>`
//! when written, and any line matching `^>+From ` loses one when read. This
//! makes quoting fully reversible.
//!
//! Nothing here knows about UIDs or flags; see `account::mailbox` for that.

mod scanner;
mod writer;

pub use self::scanner::{Record, Scanner};
pub use self::writer::{delimiter_line, write_record};

/// The format of the timestamp on a delimiter line, i.e., C's `asctime()`.
const ASCTIME_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

fn is_blank(line: &[u8]) -> bool {
    b"\n" == line || b"\r\n" == line
}

/// Returns the number of `>` characters quoting `line` if it looks like a
/// (possibly already quoted) delimiter line.
fn from_quote_depth(line: &[u8]) -> Option<usize> {
    let depth = line.iter().take_while(|&&b| b'>' == b).count();
    if line[depth..].starts_with(b"From ") {
        Some(depth)
    } else {
        None
    }
}
