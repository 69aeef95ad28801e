// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Subscriber setup for the CLI.
//!
//! Console output stays terse: the bare message, prefixed only for WARN, ERROR
//! and DEBUG. With a log file, a second layer appends full lines (timestamp,
//! level, target) to it.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::error::{Result, SdkError};

/// Console formatter: `message`, or `LEVEL: message` for non-INFO levels.
pub struct ConsoleFormat;

impl ConsoleFormat {
    fn prefix(level: &Level) -> &'static str {
        match *level {
            Level::ERROR => "ERROR: ",
            Level::WARN => "WARNING: ",
            Level::INFO => "",
            _ => "DEBUG: ",
        }
    }
}

impl<S, N> FormatEvent<S, N> for ConsoleFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(writer, "{}", Self::prefix(event.metadata().level()))?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Build the filter: `RUST_LOG` wins, then `level` (case-insensitive).
pub fn build_filter(level: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level.to_ascii_lowercase())
            .map_err(|e| SdkError::Config(format!("invalid log level '{}': {}", level, e))),
    }
}

fn open_log_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| SdkError::Io(format!("{}: {}", path.display(), e)))
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(level: &str, logfile: Option<&Path>) -> Result<()> {
    let filter = build_filter(level)?;

    let console = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .event_format(ConsoleFormat);

    let file = match logfile {
        Some(path) => Some(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(open_log_file(path)?))
                .with_ansi(false)
                .with_target(true),
        ),
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| SdkError::Config(format!("failed to install logger: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixes() {
        assert_eq!(ConsoleFormat::prefix(&Level::INFO), "");
        assert_eq!(ConsoleFormat::prefix(&Level::WARN), "WARNING: ");
        assert_eq!(ConsoleFormat::prefix(&Level::ERROR), "ERROR: ");
        assert_eq!(ConsoleFormat::prefix(&Level::DEBUG), "DEBUG: ");
    }

    #[test]
    fn test_open_log_file_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ctl.log");
        std::fs::write(&path, "first\n").unwrap();

        {
            use std::io::Write;
            let mut file = open_log_file(&path).unwrap();
            writeln!(file, "second").unwrap();
        }
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn test_open_log_file_bad_path() {
        assert!(matches!(
            open_log_file(Path::new("/nonexistent/dir/ctl.log")),
            Err(SdkError::Io(_))
        ));
    }
}
