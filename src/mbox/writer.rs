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

use std::io::{self, Write};

use chrono::prelude::*;

use super::{from_quote_depth, ASCTIME_FORMAT};

/// Build the delimiter line for a new record.
pub fn delimiter_line(sender: &str, date: DateTime<Utc>) -> Vec<u8> {
    format!("From {} {}\n", sender, date.format(ASCTIME_FORMAT)).into_bytes()
}

/// Write one record to `w`.
///
/// Line endings in both `from_line` and `data` are normalised to LF;
/// `from_line` gets one if it lacks it. In `data`, delimiter-like lines are
/// quoted, and the record is terminated with a blank line.
pub fn write_record<W: Write + ?Sized>(
    w: &mut W,
    from_line: &[u8],
    data: &[u8],
) -> io::Result<()> {
    let from_line = from_line
        .strip_suffix(b"\r\n")
        .or_else(|| from_line.strip_suffix(b"\n"))
        .unwrap_or(from_line);
    w.write_all(from_line)?;
    w.write_all(b"\n")?;

    for line in data.split_inclusive(|&b| b'\n' == b) {
        let content = line
            .strip_suffix(b"\r\n")
            .or_else(|| line.strip_suffix(b"\n"))
            .unwrap_or(line);

        if from_quote_depth(content).is_some() {
            w.write_all(b">")?;
        }
        w.write_all(content)?;
        w.write_all(b"\n")?;
    }

    w.write_all(b"\n")
}
