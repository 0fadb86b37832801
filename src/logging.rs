//! Logging setup shared by the server and the thumbnail worker.
//!
//! Both processes log to stdout. When a log directory is configured each
//! one also appends to its own file, `<dir>/<process>.log`, so the server
//! and the worker never interleave lines in one file.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::Result;

/// Process name of the HTTP server.
pub const SERVER_PROCESS: &str = "files-manager";

/// Process name of the thumbnail worker.
pub const WORKER_PROCESS: &str = "thumbnail-worker";

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

fn filter(level: &str) -> EnvFilter {
    EnvFilter::from_default_env().add_directive(parse_level(level).into())
}

/// Log file for `process`, or `None` when file logging is off.
pub fn log_path(config: &LoggingConfig, process: &str) -> Option<PathBuf> {
    let dir = config.dir.trim();
    if dir.is_empty() {
        return None;
    }
    Some(Path::new(dir).join(format!("{process}.log")))
}

/// Initialize logging for `process`.
///
/// The log file is appended to, so restarts keep earlier lines.
pub fn init(config: &LoggingConfig, process: &str) -> Result<()> {
    let Some(path) = log_path(config, process) else {
        init_console_only(&config.level);
        return Ok(());
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let log_file = Arc::new(OpenOptions::new().create(true).append(true).open(&path)?);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout.and(log_file))
                .with_ansi(false)
                .with_target(true),
        )
        .with(filter(&config.level))
        .init();

    tracing::info!("{} logging to {}", process, path.display());
    Ok(())
}

/// Console-only logging, used when the log file cannot be opened.
pub fn init_console_only(level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_ansi(true)
                .with_target(true),
        )
        .with(filter(level))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("trace"), Level::TRACE);
        assert_eq!(parse_level("DEBUG"), Level::DEBUG);
        assert_eq!(parse_level("warning"), Level::WARN);
        assert_eq!(parse_level("ERROR"), Level::ERROR);
        assert_eq!(parse_level("bogus"), Level::INFO);
    }

    #[test]
    fn test_log_path_per_process() {
        let config = LoggingConfig::default();

        assert_eq!(
            log_path(&config, SERVER_PROCESS),
            Some(PathBuf::from("logs/files-manager.log"))
        );
        assert_eq!(
            log_path(&config, WORKER_PROCESS),
            Some(PathBuf::from("logs/thumbnail-worker.log"))
        );
    }

    #[test]
    fn test_log_path_disabled() {
        let config = LoggingConfig {
            dir: " ".to_string(),
            ..LoggingConfig::default()
        };
        assert_eq!(log_path(&config, SERVER_PROCESS), None);
    }
}
