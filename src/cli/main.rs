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

use std::fs;
use std::path::PathBuf;

use structopt::clap::AppSettings;
use structopt::StructOpt;

use crate::support::diagnostic;
use crate::support::sysexits::*;
use crate::support::system_config::SystemConfig;

/// Inspect and manipulate an mbox file the way an IMAP server would.
///
/// Messages are identified by the `X-UID` header of each record and their
/// flags are kept in `X-Status`. Records without a usable `X-UID` keep their
/// place in the sequence numbering but are otherwise skipped.
#[derive(StructOpt)]
#[structopt(max_term_width = 80)]
pub(super) struct Options {
    /// Read configuration from this TOML file instead of using defaults.
    #[structopt(long, short, parse(from_os_str))]
    pub(super) config: Option<PathBuf>,

    /// Log at debug level regardless of the configuration.
    #[structopt(long, short)]
    pub(super) verbose: bool,

    #[structopt(subcommand)]
    pub(super) command: Command,
}

#[derive(StructOpt)]
pub(super) struct MailboxOption {
    /// The mbox file to operate on.
    #[structopt(parse(from_os_str))]
    pub(super) mbox: PathBuf,
}

#[derive(StructOpt)]
pub(super) enum Command {
    /// Show the status of a mailbox.
    Status(StatusSubcommand),
    /// Fetch data about messages, like the IMAP FETCH command.
    ///
    /// Results are written in the form of untagged FETCH responses, one per
    /// message, as a background thread finds them.
    List(ListSubcommand),
    /// Find messages matching IMAP search criteria.
    Search(SearchSubcommand),
    /// Append a message to a mailbox.
    Append(AppendSubcommand),
    /// Change the flags of messages, like the IMAP STORE command.
    Store(StoreSubcommand),
    /// Copy messages into another mailbox.
    ///
    /// The copies get new UIDs in the destination; the source is unchanged.
    Copy(CopySubcommand),
    /// Permanently remove all messages with the \Deleted flag.
    Expunge(MailboxOption),
    /// Flush the mailbox to disk.
    Check(MailboxOption),
}

#[derive(StructOpt)]
pub(super) struct StatusSubcommand {
    #[structopt(flatten)]
    pub(super) mailbox: MailboxOption,

    /// The status items to report, e.g. "(MESSAGES UIDNEXT)".
    #[structopt(default_value = "(MESSAGES RECENT UIDNEXT UIDVALIDITY UNSEEN)")]
    pub(super) items: String,
}

#[derive(StructOpt)]
pub(super) struct ListSubcommand {
    #[structopt(flatten)]
    pub(super) mailbox: MailboxOption,

    /// Interpret the sequence set as UIDs rather than sequence numbers.
    #[structopt(long, short)]
    pub(super) uid: bool,

    /// The messages to list, e.g. "1:*" or "3,5:7".
    pub(super) sequence_set: String,

    /// The attributes to fetch, e.g. "(UID FLAGS BODY.PEEK[HEADER])".
    #[structopt(default_value = "FAST")]
    pub(super) items: String,
}

#[derive(StructOpt)]
pub(super) struct SearchSubcommand {
    #[structopt(flatten)]
    pub(super) mailbox: MailboxOption,

    /// Return UIDs rather than sequence numbers.
    #[structopt(long, short)]
    pub(super) uid: bool,

    /// The search keys, e.g. "UNSEEN FROM alice". Multiple arguments are
    /// joined with spaces.
    #[structopt(required = true)]
    pub(super) criteria: Vec<String>,
}

/// Append a message to a mailbox.
///
/// The message is read from the given file or from standard input. Line
/// endings are normalised and any `X-UID` or `X-Status` headers it carries
/// are replaced.
#[derive(StructOpt)]
pub(super) struct AppendSubcommand {
    #[structopt(flatten)]
    pub(super) mailbox: MailboxOption,

    /// Create the mbox file if it does not already exist.
    #[structopt(long)]
    pub(super) create: bool,

    /// Give the message these flags, e.g. "(\Seen \Flagged)".
    #[structopt(long, short, default_value = "()")]
    pub(super) flags: String,

    /// The date for the delimiter line, as an IMAP date-time such as
    /// "01-Feb-2020 12:00:00 +0000" [default: now]
    #[structopt(long, short)]
    pub(super) date: Option<String>,

    /// The file containing the message. "-" reads from stdin.
    #[structopt(parse(from_os_str), default_value = "-")]
    pub(super) input: PathBuf,
}

// `-FLAGS` would otherwise be taken for a cluster of short options
#[derive(StructOpt)]
#[structopt(setting = AppSettings::AllowLeadingHyphen)]
pub(super) struct StoreSubcommand {
    #[structopt(flatten)]
    pub(super) mailbox: MailboxOption,

    /// Interpret the sequence set as UIDs rather than sequence numbers.
    #[structopt(long, short)]
    pub(super) uid: bool,

    /// Don't print the new flags.
    #[structopt(long, short)]
    pub(super) silent: bool,

    /// The messages to change.
    pub(super) sequence_set: String,

    /// "FLAGS" to replace the flags, "+FLAGS" to add, or "-FLAGS" to
    /// remove. A ".SILENT" suffix is accepted as well.
    #[structopt(allow_hyphen_values = true)]
    pub(super) operation: String,

    /// The flags to apply, e.g. "(\Deleted)".
    pub(super) flags: String,
}

#[derive(StructOpt)]
pub(super) struct CopySubcommand {
    #[structopt(flatten)]
    pub(super) mailbox: MailboxOption,

    /// Interpret the sequence set as UIDs rather than sequence numbers.
    #[structopt(long, short)]
    pub(super) uid: bool,

    /// Create the destination if it does not already exist.
    #[structopt(long)]
    pub(super) create: bool,

    /// The messages to copy.
    pub(super) sequence_set: String,

    /// The mbox file to copy into.
    #[structopt(parse(from_os_str))]
    pub(super) destination: PathBuf,
}

pub fn main() {
    // Clap exits with status 1 instead of EX_USAGE if we use the more concise
    // API
    let options =
        Options::from_clap(&match Options::clap().get_matches_safe() {
            Ok(matches) => matches,
            Err(
                e @ clap::Error {
                    kind: clap::ErrorKind::HelpDisplayed,
                    ..
                },
            )
            | Err(
                e @ clap::Error {
                    kind: clap::ErrorKind::VersionDisplayed,
                    ..
                },
            ) => {
                println!("{}", e.message);
                return;
            }
            Err(e) => {
                eprintln!("{}", e.message);
                EX_USAGE.exit()
            }
        });

    let system_config = match options.config {
        None => SystemConfig::default(),
        Some(ref path) => {
            let data = fs::read(path).unwrap_or_else(|e| {
                die!(EX_CONFIG, "Error reading '{}': {}", path.display(), e)
            });
            SystemConfig::from_toml(&data).unwrap_or_else(|e| {
                die!(
                    EX_CONFIG,
                    "Error in config file at '{}': {}",
                    path.display(),
                    e
                )
            })
        }
    };

    if let Err(exit) =
        diagnostic::apply_logging(&system_config.logging, options.verbose)
    {
        exit.exit();
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if let Err(exit) =
        super::commands::run(system_config, options.command, &mut out)
    {
        exit.exit();
    }
}
