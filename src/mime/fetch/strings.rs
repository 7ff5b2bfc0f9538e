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

//! Formatting of IMAP `string` and `nstring` values.

use std::fmt::{self, Write};

/// Write `s` as an IMAP `string`.
///
/// It is quoted if it can be; anything containing line breaks, NULs, or
/// non-ASCII characters is sent as a literal.
pub fn write_string(f: &mut impl Write, s: &str) -> fmt::Result {
    if s.bytes().all(|b| b >= b' ' && b < 127) {
        f.write_char('"')?;
        for ch in s.chars() {
            if '"' == ch || '\\' == ch {
                f.write_char('\\')?;
            }
            f.write_char(ch)?;
        }
        f.write_char('"')
    } else {
        write!(f, "{{{}}}\r\n{}", s.len(), s)
    }
}

/// Write `s` as an IMAP `nstring`, i.e., `NIL` if it is `None`.
pub fn write_nstring(f: &mut impl Write, s: Option<&str>) -> fmt::Result {
    match s {
        Some(s) => write_string(f, s),
        None => f.write_str("NIL"),
    }
}

/// Write a parenthesised list of `(key value)` string pairs, or `NIL` if there
/// are none.
pub fn write_params(
    f: &mut impl Write,
    params: &[(String, String)],
) -> fmt::Result {
    if params.is_empty() {
        return f.write_str("NIL");
    }

    f.write_char('(')?;
    for (ix, &(ref k, ref v)) in params.iter().enumerate() {
        if 0 != ix {
            f.write_char(' ')?;
        }
        write_string(f, k)?;
        f.write_char(' ')?;
        write_string(f, v)?;
    }
    f.write_char(')')
}

#[cfg(test)]
mod test {
    use super::*;

    fn string(s: &str) -> String {
        let mut out = String::new();
        write_string(&mut out, s).unwrap();
        out
    }

    #[test]
    fn string_formatting() {
        assert_eq!("\"plain\"", string("plain"));
        assert_eq!("\"a \\\"q\\\" \\\\\"", string("a \"q\" \\"));
        assert_eq!("{4}\r\na\r\nb", string("a\r\nb"));
        assert_eq!("{2}\r\n\u{e9}", string("\u{e9}"));
    }
}
