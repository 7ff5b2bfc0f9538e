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

//! Message-level processing on top of `mailparse`.
//!
//! Messages are stored with bare LF line endings, but the wire format (and so
//! everything that measures or returns message content) uses CRLF. The helpers
//! here do that conversion.

use std::borrow::Cow;

pub mod fetch;
pub mod header;

/// Return `data` with every bare LF turned into CRLF.
pub fn to_crlf(data: &[u8]) -> Cow<'_, [u8]> {
    if !has_bare_lf(data) {
        return Cow::Borrowed(data);
    }

    let mut out = Vec::with_capacity(data.len() + data.len() / 32);
    let mut prev = 0u8;
    for &b in data {
        if b'\n' == b && b'\r' != prev {
            out.push(b'\r');
        }
        out.push(b);
        prev = b;
    }
    Cow::Owned(out)
}

/// Return the length `data` would have after `to_crlf()`.
pub fn crlf_len(data: &[u8]) -> usize {
    let mut len = data.len();
    let mut prev = 0u8;
    for &b in data {
        if b'\n' == b && b'\r' != prev {
            len += 1;
        }
        prev = b;
    }
    len
}

fn has_bare_lf(data: &[u8]) -> bool {
    memchr::memchr_iter(b'\n', data).any(|ix| 0 == ix || b'\r' != data[ix - 1])
}
