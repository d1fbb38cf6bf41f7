//! Logging infrastructure for gantry.
//!
//! Provides structured logging with file output and console output:
//! - Writes to `~/.gantry/logs/gantry.log` (cleared on session start)
//! - Also prints to stderr, leaving stdout for command output
//! - Configurable via RUST_LOG environment variable
//! - Falls back to stderr only when the log file cannot be written

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::config_directory;

/// Guard that must be kept alive for the duration of logging.
///
/// Dropping this guard will flush and close the log file writer.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

impl LoggingGuard {
    /// Whether log records also go to a file.
    pub fn writes_to_file(&self) -> bool {
        self._file_guard.is_some()
    }
}

/// Initialize logging with file output in `log_dir/log_file`.
///
/// `default_level` is a filter directive (e.g. `"warn"`, `"gantry=debug"`)
/// used when RUST_LOG is not set.
///
/// # Errors
///
/// Returns error if the log directory cannot be created or the log file
/// cannot be cleared.
pub fn init_logging(
    log_dir: &Path,
    log_file: &str,
    default_level: &str,
) -> Result<LoggingGuard, io::Error> {
    prepare_log_file(log_dir, log_file)?;

    let file_appender = tracing_appender::rolling::never(log_dir, log_file);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(file_layer)
        .with(stderr_layer())
        .init();

    Ok(LoggingGuard {
        _file_guard: Some(file_guard),
    })
}

/// Initialize logging to stderr only.
pub fn init_stderr_logging(default_level: &str) -> LoggingGuard {
    tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(stderr_layer())
        .init();

    LoggingGuard { _file_guard: None }
}

/// Like [`init_logging`], but logs to stderr only when the log file
/// cannot be prepared (read-only home directory, for example).
pub fn init_logging_or_stderr(log_dir: &Path, log_file: &str, default_level: &str) -> LoggingGuard {
    match init_logging(log_dir, log_file, default_level) {
        Ok(guard) => guard,
        Err(e) => {
            let guard = init_stderr_logging(default_level);
            tracing::warn!(
                dir = %log_dir.display(),
                error = %e,
                "Log file unavailable, logging to stderr only"
            );
            guard
        }
    }
}

/// Create the log directory and clear the previous session's log.
fn prepare_log_file(log_dir: &Path, log_file: &str) -> io::Result<()> {
    fs::create_dir_all(log_dir)?;
    fs::write(log_dir.join(log_file), "")
}

fn stderr_layer<S>() -> impl tracing_subscriber::Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Map a `-v` count to a filter level.
pub fn level_for_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Get default log directory path (~/.gantry/logs).
pub fn default_log_dir() -> PathBuf {
    config_directory().join("logs")
}

/// Get default log file name.
pub fn default_log_file() -> &'static str {
    "gantry.log"
}
