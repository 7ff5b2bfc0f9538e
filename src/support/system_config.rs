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

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::support::error::Error;

/// The configuration for Mboxmap.
///
/// This is stored in a TOML file, conventionally named `mboxmap.toml`. Every
/// section is optional; a missing file is equivalent to an empty one.
#[derive(Clone, Debug, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct SystemConfig {
    /// Options controlling how the store is presented.
    #[serde(default)]
    pub mailbox: MailboxOptions,

    /// Logging setup for the CLI.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SystemConfig {
    /// Parse the configuration from the raw contents of a TOML file.
    pub fn from_toml(data: &[u8]) -> Result<Self, Error> {
        Ok(toml::from_slice(data)?)
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct MailboxOptions {
    /// How `RFC822.SIZE` and `LARGER`/`SMALLER` measure a message.
    pub size_accounting: SizeAccounting,

    /// Where the internal date of a message comes from.
    pub internal_date: InternalDateSource,

    /// The capacity of the channel used by background listings.
    ///
    /// A full channel blocks the scanner until the consumer catches up.
    pub listing_buffer: usize,

    /// The sender written into the `From ` line of appended messages.
    pub delimiter_sender: String,
}

impl Default for MailboxOptions {
    fn default() -> Self {
        MailboxOptions {
            size_accounting: SizeAccounting::default(),
            internal_date: InternalDateSource::default(),
            listing_buffer: 32,
            delimiter_sender: "MAILER-DAEMON".to_owned(),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SizeAccounting {
    /// The full message, headers included, with CRLF line endings, as
    /// RFC 3501 requires.
    Full,
    /// Only the body of the message, as stored.
    Body,
}

impl Default for SizeAccounting {
    fn default() -> Self {
        SizeAccounting::Full
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum InternalDateSource {
    /// The `Date` header of the message.
    DateHeader,
    /// The timestamp on the `From ` line which starts the record.
    Delimiter,
}

impl Default for InternalDateSource {
    fn default() -> Self {
        InternalDateSource::DateHeader
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// The level to log at when no log4rs configuration file is given.
    pub level: String,

    /// If set, a log4rs TOML configuration file which takes over all logging
    /// setup.
    pub config_file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_owned(),
            config_file: None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_config_is_default() {
        assert_eq!(
            SystemConfig::default(),
            SystemConfig::from_toml(b"").unwrap()
        );
        // RFC822.SIZE must match the length of BODY[] on the wire
        assert_eq!(
            SizeAccounting::Full,
            SystemConfig::default().mailbox.size_accounting
        );
    }

    #[test]
    fn parse_full_config() {
        let config = SystemConfig::from_toml(
            br#"
[mailbox]
size_accounting = "body"
internal_date = "delimiter"
listing_buffer = 4

[logging]
level = "debug"
config_file = "/etc/mboxmap/logging.toml"
"#,
        )
        .unwrap();

        assert_eq!(SizeAccounting::Body, config.mailbox.size_accounting);
        assert_eq!(
            InternalDateSource::Delimiter,
            config.mailbox.internal_date
        );
        assert_eq!(4, config.mailbox.listing_buffer);
        assert_eq!("MAILER-DAEMON", config.mailbox.delimiter_sender);
        assert_eq!("debug", config.logging.level);
        assert_eq!(
            Some(PathBuf::from("/etc/mboxmap/logging.toml")),
            config.logging.config_file
        );
    }

    #[test]
    fn reject_unknown_accounting() {
        assert!(SystemConfig::from_toml(
            b"[mailbox]\nsize_accounting = \"lines\"\n"
        )
        .is_err());
    }
}
