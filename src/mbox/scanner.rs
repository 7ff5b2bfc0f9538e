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

use std::io::BufRead;

use chrono::prelude::*;

use super::{from_quote_depth, is_blank, ASCTIME_FORMAT};
use crate::support::error::Error;

/// One record of an mbox store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    /// The delimiter line which started the record, including its line
    /// ending.
    pub from_line: Vec<u8>,
    /// The message itself, with mboxrd quoting removed and without the blank
    /// line that terminates the record.
    pub data: Vec<u8>,
    /// The byte offset of the delimiter line within the store.
    pub offset: u64,
}

impl Record {
    /// Returns the timestamp on the delimiter line, if there is a valid one.
    ///
    /// The timestamp is taken to be UTC. Some writers put a zone offset
    /// between the time and the year; anything after the first five
    /// date-like tokens is ignored, so such lines are not understood.
    pub fn delimiter_date(&self) -> Option<DateTime<Utc>> {
        let line = std::str::from_utf8(&self.from_line).ok()?;
        let mut tokens = line.split_whitespace().skip(2);
        let mut joined = String::new();
        for _ in 0..5 {
            if !joined.is_empty() {
                joined.push(' ');
            }
            joined.push_str(tokens.next()?);
        }

        NaiveDateTime::parse_from_str(&joined, ASCTIME_FORMAT)
            .ok()
            .map(|dt| DateTime::from_utc(dt, Utc))
    }
}

/// Iterates the records of an mbox store in file order.
///
/// The reader must be positioned at the start of the store. Once an error
/// has been returned, the scanner is exhausted.
pub struct Scanner<R> {
    reader: R,
    pos: u64,
    pending: Option<(Vec<u8>, u64)>,
    done: bool,
    line: Vec<u8>,
}

impl<R: BufRead> Scanner<R> {
    pub fn new(reader: R) -> Self {
        Scanner {
            reader,
            pos: 0,
            pending: None,
            done: false,
            line: Vec::new(),
        }
    }

    /// Read the next line into `self.line`, returning its offset, or `None`
    /// at EOF.
    fn read_line(&mut self) -> Result<Option<u64>, Error> {
        self.line.clear();
        let n = self
            .reader
            .read_until(b'\n', &mut self.line)
            .map_err(Error::Scan)?;
        if 0 == n {
            return Ok(None);
        }

        let offset = self.pos;
        self.pos += n as u64;
        Ok(Some(offset))
    }

    /// Find the first delimiter line of the store.
    fn first_delimiter(&mut self) -> Result<Option<(Vec<u8>, u64)>, Error> {
        while let Some(offset) = self.read_line()? {
            if is_blank(&self.line) {
                continue;
            }

            if self.line.starts_with(b"From ") {
                return Ok(Some((self.line.clone(), offset)));
            }

            return Err(Error::MalformedStore(offset));
        }

        Ok(None)
    }

    fn next_record(&mut self) -> Result<Option<Record>, Error> {
        let (from_line, offset) = match self.pending.take() {
            Some(pending) => pending,
            None => match self.first_delimiter()? {
                Some(first) => first,
                None => return Ok(None),
            },
        };

        let mut data = Vec::new();
        let mut trailing_blank = 0;
        loop {
            let line_offset = match self.read_line()? {
                Some(o) => o,
                None => {
                    self.done = true;
                    break;
                }
            };

            if trailing_blank > 0 && self.line.starts_with(b"From ") {
                self.pending = Some((self.line.clone(), line_offset));
                break;
            }

            trailing_blank = if is_blank(&self.line) {
                self.line.len()
            } else {
                0
            };

            match from_quote_depth(&self.line) {
                Some(depth) if depth > 0 => {
                    data.extend_from_slice(&self.line[1..])
                }
                _ => data.extend_from_slice(&self.line),
            }
        }

        data.truncate(data.len() - trailing_blank);
        Ok(Some(Record {
            from_line,
            data,
            offset,
        }))
    }
}

impl<R: BufRead> Iterator for Scanner<R> {
    type Item = Result<Record, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done && self.pending.is_none() {
            return None;
        }

        match self.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                self.pending = None;
                Some(Err(e))
            }
        }
    }
}
