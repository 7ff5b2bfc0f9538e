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

use log::LevelFilter;
use log4rs::{
    append::console::{ConsoleAppender, Target},
    config::{Appender, Config, Deserializers, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
};

use super::sysexits::*;
use super::system_config::LoggingConfig;

const STDERR_PATTERN: &str = "{d(%H:%M:%S%.3f)} [{l}][{t}] {m}{n}";

/// Set up logging according to `config`.
///
/// If `config_file` is set, log4rs takes everything from there. Otherwise,
/// log records go to stderr at the configured level, or at `Debug` if
/// `verbose` is set.
///
/// On failure, an error message has already been written to stderr, and the
/// appropriate exit code is returned.
pub fn apply_logging(
    config: &LoggingConfig,
    verbose: bool,
) -> Result<(), Sysexit> {
    if let Some(ref config_file) = config.config_file {
        return log4rs::init_file(config_file, Deserializers::new()).map_err(
            |e| {
                eprintln!(
                    "Failed to load logging configuration from '{}': {}",
                    config_file.display(),
                    e
                );
                EX_CONFIG
            },
        );
    }

    let level = if verbose {
        LevelFilter::Debug
    } else {
        config.level.parse::<LevelFilter>().map_err(|_| {
            eprintln!("Bad log level: {:?}", config.level);
            EX_CONFIG
        })?
    };

    let config = console_config(level).map_err(|e| {
        eprintln!("Failed to configure logging: {}", e);
        EX_SOFTWARE
    })?;

    log4rs::init_config(config).map(|_| ()).map_err(|e| {
        eprintln!("Failed to initialise logging: {}", e);
        EX_SOFTWARE
    })
}

/// Build a log4rs configuration which writes everything at `level` or more
/// severe to stderr.
pub fn console_config(
    level: LevelFilter,
) -> Result<Config, log4rs::config::runtime::ConfigErrors> {
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(STDERR_PATTERN)))
        .build();

    Config::builder()
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(level)))
                .build("stderr", Box::new(stderr)),
        )
        .build(Root::builder().appender("stderr").build(level))
}
