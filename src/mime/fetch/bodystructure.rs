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

use mailparse::{DispositionType, MailHeaderMap, ParsedMail};

use super::envelope::*;
use super::strings::*;
use crate::mime::{crlf_len, header};
use crate::support::error::Error;

/// The RFC 3501 `BODYSTRUCTURE` structure, sort of.
///
/// The actual `BODYSTRUCTURE` structure is wild and depends on the content
/// type of each part of the message, as well as whether the client requested
/// `BODY` or `BODYSTRUCTURE`.
///
/// This structure is simply the union of every possible field we could need.
/// Every field is computed for every part. `display()` takes this result and
/// transforms it into the more convoluted form suitable for sending to the
/// client.
///
/// An embedded `message/rfc822` part is treated as a multipart that has
/// exactly one child, the message.
///
/// The actual format is shown below, with § indicating the boundary between
/// "basic" and "extended" fields.
///
/// - `multipart/*`: (child)(child)(...) content-subtype §
///   (content-type-parms) (content-disposition content-disposition-parms)
///   content-language content-location
/// - `message/rfc822`: content-type content-subtype (content-type-parms)
///   content-id content-description content-transfer-encoding size-octets
///   (rfc3501-envelope) (rfc3501-bodystructure) size-lines §
///   md5 (content-disposition content-disposition-parms) content-language
///   content-location
/// - `text/*`: content-type content-subtype (content-type-parms) content-id
///   content-description content-transfer-encoding size-octets size-lines §
///   md5 (content-disposition content-disposition-parms) content-language
///   content-location
/// - `*/*`: content-type content-subtype (content-type-parms) content-id
///   content-description content-transfer-encoding size-octets §
///   md5 (content-disposition content-disposition-parms) content-language
///   content-location
///
/// The MD5 is always reported as NIL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BodyStructure {
    /// The content type and subtype of this part, lower-case.
    pub content_type: (String, String),
    /// Any parameters on the content type.
    pub content_type_parms: Vec<(String, String)>,
    /// The `Content-Disposition` of this part, if set.
    pub content_disposition: Option<String>,
    /// Any parameters on the `Content-Disposition` header.
    pub content_disposition_parms: Vec<(String, String)>,
    /// The `Content-Language` header, if set.
    pub content_language: Option<String>,
    /// The `Content-Location` header, if set.
    pub content_location: Option<String>,
    /// The `Content-Id` header, if set.
    pub content_id: Option<String>,
    /// The `Content-Description` header, if set, decoded.
    pub content_description: Option<String>,
    /// The `Content-Transfer-Encoding` of this part, lower-case.
    pub content_transfer_encoding: String,
    /// The exact length of the content of this part, measured in encoded form
    /// with CRLF line endings.
    pub size_octets: u64,
    /// The number of lines of the content of this part, measured in encoded
    /// form.
    pub size_lines: u64,
    /// The envelope extracted from this part's headers.
    pub envelope: Envelope,
    /// If this is a multipart, the parts it contains.
    pub children: Vec<BodyStructure>,
}

/// Compute the body structure of the message in `data`.
pub fn body_structure(data: &[u8]) -> Result<BodyStructure, Error> {
    let parsed = mailparse::parse_mail(data)?;
    from_parsed(&parsed)
}

fn from_parsed(part: &ParsedMail<'_>) -> Result<BodyStructure, Error> {
    let mut split = part.ctype.mimetype.splitn(2, '/');
    let content_type = (
        split.next().unwrap_or("text").to_ascii_lowercase(),
        split.next().unwrap_or("plain").to_ascii_lowercase(),
    );

    let offset =
        header::body_offset(part.raw_bytes).unwrap_or(part.raw_bytes.len());
    let content = &part.raw_bytes[offset..];

    let headers = &part.headers[..];
    let (content_disposition, content_disposition_parms) =
        if headers.get_first_header("Content-Disposition").is_some() {
            let cd = part.get_content_disposition();
            let name = match cd.disposition {
                DispositionType::Inline => "inline".to_owned(),
                DispositionType::Attachment => "attachment".to_owned(),
                DispositionType::FormData => "form-data".to_owned(),
                DispositionType::Extension(ref ext) => ext.to_ascii_lowercase(),
            };
            (Some(name), cd.params.into_iter().collect())
        } else {
            (None, vec![])
        };

    let mut children = Vec::new();
    if "multipart" == content_type.0 {
        for subpart in &part.subparts {
            children.push(from_parsed(subpart)?);
        }
    } else if "message" == content_type.0 && "rfc822" == content_type.1 {
        let embedded = part.get_body_raw()?;
        let embedded = mailparse::parse_mail(&embedded)?;
        children.push(from_parsed(&embedded)?);
    }

    Ok(BodyStructure {
        content_type,
        content_type_parms: part
            .ctype
            .params
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
        content_disposition,
        content_disposition_parms,
        content_language: headers.get_first_value("Content-Language"),
        content_location: headers.get_first_value("Content-Location"),
        content_id: headers
            .get_first_value("Content-Id")
            .map(|v| v.trim().to_owned()),
        content_description: headers.get_first_value("Content-Description"),
        content_transfer_encoding: headers
            .get_first_value("Content-Transfer-Encoding")
            .map(|v| v.trim().to_ascii_lowercase())
            .unwrap_or_else(|| "7bit".to_owned()),
        size_octets: crlf_len(content) as u64,
        size_lines: memchr::memchr_iter(b'\n', content).count() as u64,
        envelope: envelope(headers),
        children,
    })
}

impl BodyStructure {
    /// Return a `Display` which formats this structure for the `BODY`
    /// (`extended == false`) or `BODYSTRUCTURE` (`extended == true`) fetch
    /// items.
    pub fn display(&self, extended: bool) -> impl fmt::Display + '_ {
        BodyStructureDisplay {
            bs: self,
            extended,
        }
    }
}

struct BodyStructureDisplay<'a> {
    bs: &'a BodyStructure,
    extended: bool,
}

impl fmt::Display for BodyStructureDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let bs = self.bs;
        let (ref ty, ref subty) = bs.content_type;

        write!(f, "(")?;
        if "multipart" == ty {
            for child in &bs.children {
                write!(f, "{}", child.display(self.extended))?;
            }
            write!(f, " ")?;
            write_string(f, subty)?;
            if self.extended {
                write!(f, " ")?;
                write_params(f, &bs.content_type_parms)?;
                self.write_tail(f)?;
            }
            return write!(f, ")");
        }

        write_string(f, ty)?;
        write!(f, " ")?;
        write_string(f, subty)?;
        write!(f, " ")?;
        write_params(f, &bs.content_type_parms)?;
        write!(f, " ")?;
        write_nstring(f, bs.content_id.as_deref())?;
        write!(f, " ")?;
        write_nstring(f, bs.content_description.as_deref())?;
        write!(f, " ")?;
        write_string(f, &bs.content_transfer_encoding)?;
        write!(f, " {}", bs.size_octets)?;

        if "message" == ty && "rfc822" == subty {
            if let Some(embedded) = bs.children.first() {
                write!(
                    f,
                    " {} {}",
                    embedded.envelope,
                    embedded.display(self.extended)
                )?;
            }
            write!(f, " {}", bs.size_lines)?;
        } else if "text" == ty {
            write!(f, " {}", bs.size_lines)?;
        }

        if self.extended {
            write!(f, " NIL")?;
            self.write_tail(f)?;
        }
        write!(f, ")")
    }
}

impl BodyStructureDisplay<'_> {
    /// Write the disposition, language, and location extension fields.
    fn write_tail(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let bs = self.bs;
        write!(f, " ")?;
        match bs.content_disposition {
            Some(ref disposition) => {
                write!(f, "(")?;
                write_string(f, disposition)?;
                write!(f, " ")?;
                write_params(f, &bs.content_disposition_parms)?;
                write!(f, ")")?;
            }
            None => write!(f, "NIL")?,
        }
        write!(f, " ")?;
        write_nstring(f, bs.content_language.as_deref())?;
        write!(f, " ")?;
        write_nstring(f, bs.content_location.as_deref())
    }
}
