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

use tempfile::TempDir;

use super::defs::*;
use crate::support::system_config::MailboxOptions;

pub struct Setup {
    pub root: TempDir,
    pub path: PathBuf,
    pub mailbox: Mailbox,
}

/// Create a scratch store holding `store` and open it read-write with the
/// default options.
pub fn set_up(store: &[u8]) -> Setup {
    set_up_with(store, MailboxOptions::default())
}

pub fn set_up_with(store: &[u8], options: MailboxOptions) -> Setup {
    crate::init_test_log();

    let root = TempDir::new().unwrap();
    let path = root.path().join("INBOX.mbox");
    fs::write(&path, store).unwrap();
    let mailbox = Mailbox::open(&path, false, options).unwrap();

    Setup {
        root,
        path,
        mailbox,
    }
}

impl Setup {
    /// Open a second, independent handle on the same store.
    pub fn reopen(&self) -> Mailbox {
        Mailbox::open(&self.path, false, self.mailbox.options.clone()).unwrap()
    }

    pub fn reopen_read_only(&self) -> Mailbox {
        Mailbox::open(&self.path, true, self.mailbox.options.clone()).unwrap()
    }

    /// The current content of the store on disk.
    pub fn contents(&self) -> String {
        String::from_utf8(fs::read(&self.path).unwrap()).unwrap()
    }
}
