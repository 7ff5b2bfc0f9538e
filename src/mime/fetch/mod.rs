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

//! The message-content side of the IMAP `FETCH` operation.
//!
//! ## Regarding message layout
//!
//! IMAP defines a mechanism to access parts of a message based on its
//! multipart hierarchy. Each part of a multipart is assigned a number,
//! starting at 1. Parts can be addressed by multiple subscripts, such that,
//! e.g., `2.3` is the third sub-part of the second part. A non-multipart
//! element has subscript 1.
//!
//! IMAP also allows traversing `message/rfc822` parts by this mechanism,
//! though in an inconsistent and poorly-defined way.
//!
//! After zero or more subscripts, we get a final subsection specifier. This
//! can be one of:
//!
//! - Nothing. At top level, this fetches the whole message. For any other
//!   part, it fetches the part content.
//!
//! - `HEADER`. At top level, this fetches the headers. For any other part, it
//!   ignores the actual headers and instead fetches the headers of an embedded
//!   `message/rfc822` part. `HEADER.FIELDS` and `HEADER.FIELDS.NOT` filter
//!   the result on a whitelist or blacklist.
//!
//! - `MIME`. Invalid at top level. For any other part, it fetches the headers
//!   of the part.
//!
//! - `TEXT`. At top level, this fetches the content of the message. For any
//!   other part, fetches the content of an embedded `message/rfc822` part.
//!
//! The parser maps these onto `section::LeafType` as follows:
//!
//! - Nothing at top-level becomes `Full`.
//! - Nothing at non-top-level becomes `Content`.
//! - `HEADER` becomes `Headers`, `MIME` becomes `Mime`, `TEXT` becomes `Text`.
//!
//! `Headers` and `Text` below the top level only make sense for a
//! `message/rfc822` part; for anything else, the section does not exist.
//!
//! If a subscript lands on an embedded `message/rfc822`, the next subscript
//! applies to the embedded message, so `3.1` is the first part of the message
//! attached as part 3.
//!
//! Everything here works on a fully buffered copy of the message, so fetching
//! one item never disturbs another.

pub mod bodystructure;
pub mod envelope;
pub mod section;
pub mod strings;
