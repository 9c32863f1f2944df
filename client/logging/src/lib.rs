#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! Logging setup for the claim topics client.
//!
//! Installs a `tracing-subscriber` formatter at the configured level, either
//! on stderr or appended to a log file, and provides a small module-prefixed
//! trace helper for call sites that only have a message string.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;

use thiserror::Error;
use tracing::Level;

/// Errors raised while installing the global subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The configured level is not one of trace/debug/info/warn/error.
    #[error("Unknown log level: {0}")]
    UnknownLevel(String),
    /// The log file could not be opened for appending.
    #[error("Failed to open log file {path}: {source}")]
    File {
        /// Path of the log file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// A global subscriber was already installed.
    #[error("Logging already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Parses a level name (`info`, `DEBUG`, ...).
pub fn parse_level(level: &str) -> Result<Level, LoggingError> {
    Level::from_str(level.trim()).map_err(|_| LoggingError::UnknownLevel(level.to_string()))
}

/// Installs the global `tracing` subscriber.
///
/// Output goes to stderr unless `file` is given, in which case events are
/// appended to that file without ANSI colouring.
pub fn init(level: &str, file: Option<&Path>) -> Result<(), LoggingError> {
    let level = parse_level(level)?;
    let builder = tracing_subscriber::fmt().with_max_level(level).with_target(true);

    let installed = match file {
        Some(path) => {
            let log_file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| LoggingError::File { path: path.to_path_buf(), source })?;
            builder.with_ansi(false).with_writer(Mutex::new(log_file)).try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };

    installed.map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))
}

/// Emits a trace event with a module prefix.
pub fn trace(module: &str, msg: &str) {
    tracing::trace!("[{}] {}", module, msg);
}
