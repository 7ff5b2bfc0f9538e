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

//! Mboxmap presents a single mbox file as an IMAP-style mailbox.
//!
//! Message identity comes from the `X-UID` header of each record and flags
//! are kept in `X-Status`, so the store stays readable by ordinary mbox
//! tools. See `account::mailbox::Mailbox` for the entry point.

pub mod account;
pub mod cli;
pub mod imap;
pub mod mbox;
pub mod mime;
pub mod support;

#[cfg(test)]
mod test_data;

#[cfg(test)]
static INIT_TEST_LOG: std::sync::Once = std::sync::Once::new();

#[cfg(test)]
fn init_test_log() {
    INIT_TEST_LOG.call_once(|| {
        let config = support::diagnostic::console_config(
            log::LevelFilter::Debug,
        )
        .unwrap();
        log4rs::init_config(config).unwrap();
    })
}
