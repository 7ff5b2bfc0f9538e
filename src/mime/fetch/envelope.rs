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

use std::fmt;

use mailparse::{MailAddr, MailHeader, MailHeaderMap, SingleInfo};

use super::strings::*;
use crate::mime::header;

/// The `ENVELOPE` structure defined by RFC 3501, in the order the fields are
/// to be sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Envelope {
    /// The `Date` header.
    ///
    /// RFC 3501 forbids this from being empty since it is a required field in
    /// RFC 2822, but offers no guidance of what the server should do if it
    /// nonetheless encounters such a message.
    pub date: Option<String>,
    /// The `Subject` header, decoded.
    pub subject: Option<String>,
    /// The `From` header, decoded.
    ///
    /// Messages with no intelligible `From` header do exist in the wild. For
    /// these, we break RFC 3501's requirement and return NIL.
    pub from: Vec<EnvelopeAddress>,
    /// The `Sender` header, decoded, or a copy of `from` if absent.
    pub sender: Vec<EnvelopeAddress>,
    /// The `Reply-To` header, decoded, or a copy of `from` if absent.
    pub reply_to: Vec<EnvelopeAddress>,
    /// The `To` header, decoded.
    pub to: Vec<EnvelopeAddress>,
    /// The `CC` header, decoded.
    pub cc: Vec<EnvelopeAddress>,
    /// The `BCC` header, decoded.
    pub bcc: Vec<EnvelopeAddress>,
    /// The `In-Reply-To` header, trimmed.
    pub in_reply_to: Option<String>,
    /// The `Message-ID` header, trimmed.
    pub message_id: Option<String>,
}

/// Representation of an email address, or a group fragment, in an RFC 3501
/// `ENVELOPE`.
///
/// A group is started with an "address" with a name but no domain, and
/// terminated with an "address" with neither local part nor domain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvelopeAddress {
    /// The display name if present, decoded.
    pub name: Option<String>,
    /// RFC 822 source routing is long dead, so this is always NIL.
    pub routing: (),
    /// The local part of the address.
    ///
    /// If `None` and `domain` is also `None`, this is a group-end delimiter.
    pub local: Option<String>,
    /// The domain of the address.
    ///
    /// If `None`, this is either a group-start or group-end delimiter,
    /// depending on the value of `local`.
    pub domain: Option<String>,
}

/// Extract the envelope from the given header fields.
pub fn envelope(headers: &[MailHeader<'_>]) -> Envelope {
    let from = addresses(headers, "From");
    let sender = Some(addresses(headers, "Sender"))
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| from.clone());
    let reply_to = Some(addresses(headers, "Reply-To"))
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| from.clone());

    Envelope {
        date: headers.get_first_value("Date").map(|raw| {
            header::parse_datetime(&raw)
                .map(|dt| dt.to_rfc2822())
                // If we can't parse the date, send whatever we have to the
                // client and let them try to figure it out.
                .unwrap_or_else(|| raw.trim().to_owned())
        }),
        subject: headers.get_first_value("Subject"),
        from,
        sender,
        reply_to,
        to: addresses(headers, "To"),
        cc: addresses(headers, "Cc"),
        bcc: addresses(headers, "Bcc"),
        in_reply_to: trimmed(headers, "In-Reply-To"),
        message_id: trimmed(headers, "Message-ID"),
    }
}

fn trimmed(headers: &[MailHeader<'_>], name: &str) -> Option<String> {
    headers
        .get_first_value(name)
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn addresses(headers: &[MailHeader<'_>], name: &str) -> Vec<EnvelopeAddress> {
    let list = match headers
        .get_first_header(name)
        .map(mailparse::addrparse_header)
    {
        Some(Ok(list)) => list,
        _ => return Vec::new(),
    };

    let mut out = Vec::new();
    for address in list.iter() {
        match *address {
            MailAddr::Single(ref single) => {
                out.push(to_envelope_address(single))
            }
            MailAddr::Group(ref group) => {
                out.push(EnvelopeAddress {
                    name: None,
                    routing: (),
                    // Bizarrely, despite there being a field for the
                    // display name, RFC 3501 has us put the display name
                    // of groups into the local part...
                    local: Some(group.group_name.clone()),
                    domain: None,
                });
                out.extend(group.addrs.iter().map(to_envelope_address));
                out.push(EnvelopeAddress::default());
            }
        }
    }
    out
}

fn to_envelope_address(single: &SingleInfo) -> EnvelopeAddress {
    let (local, domain) = match single.addr.rfind('@') {
        Some(at) => (&single.addr[..at], Some(&single.addr[at + 1..])),
        None => (&single.addr[..], None),
    };

    EnvelopeAddress {
        name: single.display_name.clone().filter(|s| !s.is_empty()),
        routing: (),
        local: Some(local.to_owned()),
        // A bare local part still needs a non-NIL domain, or the client
        // would see a group delimiter.
        domain: Some(domain.unwrap_or("").to_owned()),
    }
}

fn write_addresses(
    f: &mut fmt::Formatter,
    addresses: &[EnvelopeAddress],
) -> fmt::Result {
    if addresses.is_empty() {
        return write!(f, "NIL");
    }

    write!(f, "(")?;
    for address in addresses {
        write!(f, "(")?;
        write_nstring(f, address.name.as_deref())?;
        write!(f, " NIL ")?;
        write_nstring(f, address.local.as_deref())?;
        write!(f, " ")?;
        write_nstring(f, address.domain.as_deref())?;
        write!(f, ")")?;
    }
    write!(f, ")")
}

/// Formats the envelope in IMAP wire format.
impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "(")?;
        write_nstring(f, self.date.as_deref())?;
        write!(f, " ")?;
        write_nstring(f, self.subject.as_deref())?;
        for list in &[
            &self.from,
            &self.sender,
            &self.reply_to,
            &self.to,
            &self.cc,
            &self.bcc,
        ] {
            write!(f, " ")?;
            write_addresses(f, list)?;
        }
        write!(f, " ")?;
        write_nstring(f, self.in_reply_to.as_deref())?;
        write!(f, " ")?;
        write_nstring(f, self.message_id.as_deref())?;
        write!(f, ")")
    }
}
