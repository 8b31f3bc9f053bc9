//! Action log setup: every record goes to the console and is appended to a
//! plain-text log file.

use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Log file written in the working directory unless `--log-file` says otherwise.
pub const DEFAULT_LOG_FILE: &str = "file_organizer.log";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Splits a log path into the directory and file name `tracing_appender` expects.
fn split_log_path(log_file: &Path) -> (PathBuf, String) {
    let directory = match log_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let file_name = log_file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_LOG_FILE.to_string());
    (directory, file_name)
}

/// Colors the console only when stdout is a terminal and `NO_COLOR` is unset
/// or empty.
fn console_ansi(is_terminal: bool, no_color: Option<OsString>) -> bool {
    is_terminal && no_color.is_none_or(|value| value.is_empty())
}

/// Installs the global subscriber.
///
/// The level comes from `RUST_LOG` and defaults to `info`. The returned guard
/// flushes the file writer when dropped, so keep it alive until exit.
pub fn init_logging(log_file: &Path) -> anyhow::Result<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (directory, file_name) = split_log_path(log_file);
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(directory)?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stdout)
                .with_target(false)
                .with_timer(ChronoLocal::new(TIMESTAMP_FORMAT.to_string()))
                .with_ansi(console_ansi(
                    std::io::stdout().is_terminal(),
                    std::env::var_os("NO_COLOR"),
                )),
        )
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_target(false)
                .with_timer(ChronoLocal::new(TIMESTAMP_FORMAT.to_string()))
                .with_ansi(false),
        )
        .try_init()?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_bare_file_name() {
        let (dir, name) = split_log_path(Path::new("file_organizer.log"));
        assert_eq!(dir, PathBuf::from("."));
        assert_eq!(name, "file_organizer.log");
    }

    #[test]
    fn test_console_ansi_only_on_terminal() {
        assert!(console_ansi(true, None));
        assert!(console_ansi(true, Some(OsString::new())));
        assert!(!console_ansi(false, None));
        assert!(!console_ansi(true, Some(OsString::from("1"))));
    }

    #[test]
    fn test_split_nested_path() {
        let (dir, name) = split_log_path(Path::new("/var/log/arranger/run.log"));
        assert_eq!(dir, PathBuf::from("/var/log/arranger"));
        assert_eq!(name, "run.log");
    }
}
