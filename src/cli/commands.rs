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
use std::io::{self, Read, Write};
use std::path::Path;

use chrono::prelude::*;
use log::error;

use super::main::*;
use crate::account::mailbox::Mailbox;
use crate::account::model::*;
use crate::imap::syntax;
use crate::support::{
    error::Error, sysexits::*, system_config::MailboxOptions,
    system_config::SystemConfig,
};

/// Execute `command`, writing IMAP-style responses to `out`.
///
/// Failures are logged before the exit code is returned.
pub(super) fn run(
    system_config: SystemConfig,
    command: Command,
    out: &mut impl Write,
) -> Result<(), Sysexit> {
    let options = system_config.mailbox;
    let (path, result) = match command {
        Command::Status(cmd) => {
            (cmd.mailbox.mbox.clone(), status(cmd, options, out))
        }
        Command::List(cmd) => {
            (cmd.mailbox.mbox.clone(), list(cmd, options, out))
        }
        Command::Search(cmd) => {
            (cmd.mailbox.mbox.clone(), search(cmd, options, out))
        }
        Command::Append(cmd) => {
            (cmd.mailbox.mbox.clone(), append(cmd, options, out))
        }
        Command::Store(cmd) => {
            (cmd.mailbox.mbox.clone(), store(cmd, options, out))
        }
        Command::Copy(cmd) => {
            (cmd.mailbox.mbox.clone(), copy(cmd, options, out))
        }
        Command::Expunge(cmd) => {
            let result = expunge(&cmd.mbox, options, out);
            (cmd.mbox, result)
        }
        Command::Check(cmd) => {
            let result = open(&cmd.mbox, false, options)
                .and_then(|mut mailbox| mailbox.check());
            (cmd.mbox, result)
        }
    };

    result.map_err(|e| {
        error!("{}: {}", path.display(), e);
        match e {
            Error::Io(ref e) if io::ErrorKind::NotFound == e.kind() => {
                EX_NOINPUT
            }
            e => Sysexit::from(&e),
        }
    })
}

fn open(
    path: &Path,
    read_only: bool,
    options: MailboxOptions,
) -> Result<Mailbox, Error> {
    Mailbox::open(path, read_only, options)
}

fn open_or_create(
    path: &Path,
    create: bool,
    options: MailboxOptions,
) -> Result<Mailbox, Error> {
    if create && !path.exists() {
        Mailbox::create(path, options)
    } else {
        open(path, false, options)
    }
}

fn status(
    cmd: StatusSubcommand,
    options: MailboxOptions,
    out: &mut impl Write,
) -> Result<(), Error> {
    let items = syntax::status_items(&cmd.items)?;
    let status = open(&cmd.mailbox.mbox, true, options)?.status(&items)?;
    writeln!(out, "{}", format_status(&status))?;
    Ok(())
}

fn format_status(status: &MailboxStatus) -> String {
    let items = status
        .items
        .iter()
        .map(|item| match *item {
            StatusItem::Messages => format!("MESSAGES {}", status.messages),
            StatusItem::Recent => format!("RECENT {}", status.recent),
            StatusItem::UidNext => format!("UIDNEXT {}", status.uid_next),
            StatusItem::UidValidity => {
                format!("UIDVALIDITY {}", status.uid_validity)
            }
            StatusItem::Unseen => format!("UNSEEN {}", status.unseen),
        })
        .collect::<Vec<_>>();

    format!("* STATUS {} ({})", status.name, items.join(" "))
}

fn list(
    cmd: ListSubcommand,
    options: MailboxOptions,
    out: &mut impl Write,
) -> Result<(), Error> {
    let ids = cmd.sequence_set.parse::<SeqSet>()?;
    let items = syntax::fetch_items(&cmd.items)?;
    let mailbox = open(&cmd.mailbox.mbox, true, options)?;

    let (receiver, lister) = mailbox.spawn_listing(cmd.uid, ids, items)?;
    for message in receiver {
        message?.write_to(out)?;
    }

    if lister.join().is_err() {
        error!("{} Listing thread panicked", mailbox.log_prefix());
    }

    Ok(())
}

fn search(
    cmd: SearchSubcommand,
    options: MailboxOptions,
    out: &mut impl Write,
) -> Result<(), Error> {
    let queries = syntax::search_keys(&cmd.criteria.join(" "))?;
    let mut mailbox = open(&cmd.mailbox.mbox, true, options)?;
    let hits = mailbox.search_messages(cmd.uid, &queries)?;

    write!(out, "* SEARCH")?;
    for hit in hits {
        write!(out, " {}", hit)?;
    }
    writeln!(out)?;
    Ok(())
}

fn append(
    cmd: AppendSubcommand,
    options: MailboxOptions,
    out: &mut impl Write,
) -> Result<(), Error> {
    let flags = syntax::flag_list(&cmd.flags)?;
    let date = match cmd.date {
        Some(ref date) => syntax::date_time(date)?.with_timezone(&Utc),
        None => Utc::now(),
    };

    let data = if Path::new("-") == cmd.input {
        let mut data = Vec::new();
        io::stdin().lock().read_to_end(&mut data)?;
        data
    } else {
        fs::read(&cmd.input)?
    };

    let mut mailbox = open_or_create(&cmd.mailbox.mbox, cmd.create, options)?;
    let uid = mailbox.create_message(&flags, date, &data)?;
    writeln!(out, "OK [APPENDUID {} {}]", UID_VALIDITY, uid)?;
    Ok(())
}

fn store(
    cmd: StoreSubcommand,
    options: MailboxOptions,
    out: &mut impl Write,
) -> Result<(), Error> {
    let ids = cmd.sequence_set.parse::<SeqSet>()?;
    let flags = syntax::flag_list(&cmd.flags)?;
    let operation = cmd.operation.to_ascii_uppercase();
    let (op, silent) = match operation
        .strip_suffix(".SILENT")
        .map_or((operation.as_str(), false), |op| (op, true))
    {
        ("FLAGS", silent) => (FlagsOp::Set, silent),
        ("+FLAGS", silent) => (FlagsOp::Add, silent),
        ("-FLAGS", silent) => (FlagsOp::Remove, silent),
        _ => {
            return Err(Error::Syntax(format!(
                "unknown STORE operation {:?}",
                cmd.operation
            )))
        }
    };

    let mut mailbox = open(&cmd.mailbox.mbox, false, options)?;
    let updated = mailbox.update_messages_flags(cmd.uid, &ids, op, &flags)?;

    if !silent && !cmd.silent {
        for u in updated {
            let flags = u
                .flags
                .iter()
                .map(|f| f.to_string())
                .collect::<Vec<_>>()
                .join(" ");
            writeln!(
                out,
                "* {} FETCH (FLAGS ({}) UID {})",
                u.seqnum, flags, u.uid
            )?;
        }
    }

    Ok(())
}

fn copy(
    cmd: CopySubcommand,
    options: MailboxOptions,
    out: &mut impl Write,
) -> Result<(), Error> {
    let ids = cmd.sequence_set.parse::<SeqSet>()?;
    let mut dest =
        open_or_create(&cmd.destination, cmd.create, options.clone())?;
    let mut src = open(&cmd.mailbox.mbox, true, options)?;
    let copied = src.copy_messages(cmd.uid, &ids, &mut dest)?;

    if copied.is_empty() {
        writeln!(out, "OK")?;
    } else {
        let join = |uids: &mut dyn Iterator<Item = Uid>| {
            uids.map(|u| u.to_string()).collect::<Vec<_>>().join(",")
        };
        writeln!(
            out,
            "OK [COPYUID {} {} {}]",
            UID_VALIDITY,
            join(&mut copied.iter().map(|&(s, _)| s)),
            join(&mut copied.iter().map(|&(_, d)| d)),
        )?;
    }
    Ok(())
}

fn expunge(
    path: &Path,
    options: MailboxOptions,
    out: &mut impl Write,
) -> Result<(), Error> {
    let mut mailbox = open(path, false, options)?;
    for seqnum in mailbox.expunge()? {
        writeln!(out, "* {} EXPUNGE", seqnum)?;
    }
    Ok(())
}
