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

/// A `multipart/mixed` message with a text part, a base64 attachment, and an
/// embedded `message/rfc822`.
pub static MULTIPART_MESSAGE: &[u8] = include_bytes!("multipart.eml");

/// Two messages with UIDs 5 and 9. The first is `\Seen \Answered`, the
/// second `\Deleted`.
pub static SCENARIO_MBOX: &[u8] = include_bytes!("scenario.mbox");

/// Three messages, of which the second has no `X-UID` header. The others have
/// UIDs 1 and 2; the last is `\Flagged`.
pub static NO_UID_MBOX: &[u8] = include_bytes!("no_uid.mbox");
