//! Logging setup.
//!
//! Two sinks share one filter: human-readable output on stderr and a durable
//! `client.log` in the log directory. The file writer is synchronous so a
//! terminal error logged right before `process::exit` is already on disk.
//!
//! The filter comes from `RUST_LOG` when set, otherwise [`DEFAULT_FILTER`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, EnvFilter};

/// File name of the durable log.
pub const LOG_FILE_NAME: &str = "client.log";

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "meshview=info";

/// Errors while installing the subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Cannot create log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot open log file: {0}")]
    Appender(#[from] InitError),

    #[error("Logging already initialized: {0}")]
    AlreadyInitialized(#[from] TryInitError),
}

/// Open `client.log` under `dir` in append mode, creating the directory.
pub fn log_file(dir: &Path) -> Result<RollingFileAppender, LoggingError> {
    fs::create_dir_all(dir).map_err(|source| LoggingError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    Ok(RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(LOG_FILE_NAME)
        .build(dir)?)
}

/// Install the global subscriber and write the start marker.
///
/// Returns the path of the durable log file.
pub fn init_logging(dir: &Path) -> Result<PathBuf, LoggingError> {
    let file = log_file(dir)?;
    let timer = LocalTime::new(time::macros::format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]"
    ));

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_timer(timer.clone())
                .with_target(false),
        )
        .with(
            fmt::layer()
                .with_writer(file)
                .with_timer(timer)
                .with_ansi(false),
        )
        .try_init()?;

    let path = dir.join(LOG_FILE_NAME);
    info!(
        version = crate::VERSION,
        pid = std::process::id(),
        log = %path.display(),
        "client start"
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_log_file_created_in_nested_dir() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("a").join("logs");

        let mut file = log_file(&dir).unwrap();
        file.write_all(b"client start\n").unwrap();
        file.flush().unwrap();

        let contents = fs::read_to_string(dir.join(LOG_FILE_NAME)).unwrap();
        assert_eq!(contents, "client start\n");
    }

    #[test]
    fn test_log_file_appends() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(LOG_FILE_NAME), "earlier\n").unwrap();

        let mut file = log_file(temp.path()).unwrap();
        file.write_all(b"later\n").unwrap();
        file.flush().unwrap();

        let contents = fs::read_to_string(temp.path().join(LOG_FILE_NAME)).unwrap();
        assert_eq!(contents, "earlier\nlater\n");
    }

    #[test]
    fn test_log_dir_is_a_file() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, "x").unwrap();

        let err = log_file(&blocker.join("logs")).unwrap_err();
        assert!(matches!(err, LoggingError::CreateDir { .. }));
    }
}
