//! Supervisor diagnostic logging.
//!
//! All diagnostic output of the supervisor (never of its children) flows
//! through `tracing`. The subscriber is installed once, writing to stderr;
//! once the configuration is loaded, [`redirect_to_file`] switches subsequent
//! output to the global `logfile`, opened in append-create-read-write mode.
//! Child stdout/stderr never passes through here; it is wired directly to the
//! per-program log files by the runner.
//!
//! The CLI accepts the levels `trace`, `debug`, `info`, `warn`, `error`, and
//! `critical`; `critical` maps to [`Level::ERROR`], the closest tracing level.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::OnceLock;

use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::error::SupervisorError;

/// Destination for diagnostics after [`redirect_to_file`] succeeds.
static LOG_FILE: OnceLock<File> = OnceLock::new();

/// Parses a CLI log level. Unknown names fall back to `error`, the default
/// of the front end.
pub fn parse_level(s: &str) -> Level {
    match s.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" | "critical" => Level::ERROR,
        _ => Level::ERROR,
    }
}

fn log_writer() -> Box<dyn Write + Send> {
    match LOG_FILE.get() {
        Some(file) => Box::new(file),
        None => Box::new(io::stderr()),
    }
}

/// Installs the global subscriber. Subsequent calls are silently ignored.
pub fn init(level: Level) {
    let filter = EnvFilter::new(level.to_string().to_lowercase());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(|| log_writer())
        .try_init();
}

/// Redirects subsequent diagnostics to `path`, opened for appending (created
/// if absent). The redirect is one-way and happens at most once.
pub fn redirect_to_file(path: &Path) -> Result<(), SupervisorError> {
    let file = OpenOptions::new()
        .append(true)
        .create(true)
        .read(true)
        .open(path)
        .map_err(|source| SupervisorError::LogFile {
            path: path.display().to_string(),
            source,
        })?;
    let _ = LOG_FILE.set(file);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_cli_levels() {
        assert_eq!(parse_level("trace"), Level::TRACE);
        assert_eq!(parse_level("debug"), Level::DEBUG);
        assert_eq!(parse_level("info"), Level::INFO);
        assert_eq!(parse_level("warn"), Level::WARN);
        assert_eq!(parse_level("error"), Level::ERROR);
        assert_eq!(parse_level("critical"), Level::ERROR);
        assert_eq!(parse_level("CRITICAL"), Level::ERROR);
    }

    #[test]
    fn unknown_level_falls_back_to_error() {
        assert_eq!(parse_level("chatty"), Level::ERROR);
    }
}
