//! Per-run logging.
//!
//! A [`RunLog`] owns a `tracing` dispatcher for one invocation: a plain-text
//! file layer at the configured level, plus a stderr layer driven by
//! `RUST_LOG` (default `warn`). [`RunLog::scope`] installs it for the
//! duration of a closure, so nothing is initialised process-wide.
//!
//! Conversions run on rayon workers, which do not inherit the scoped
//! dispatcher. The batch therefore logs outcomes from the coordinating thread
//! after the workers finish.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;
use thiserror::Error;
use tracing::Dispatch;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::prelude::*;

#[derive(Error, Debug)]
pub enum LogError {
    #[error("Cannot create log file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid log level: {0}")]
    Level(String),
}

pub struct RunLog {
    dispatch: Dispatch,
    path: PathBuf,
}

impl RunLog {
    /// Create (truncate) the log file at `path` and build the dispatcher.
    pub fn create(path: &Path, level: &str) -> Result<Self, LogError> {
        let io_err = |source| LogError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let file = File::create(path).map_err(io_err)?;
        let file_level =
            LevelFilter::from_str(level).map_err(|_| LogError::Level(level.to_string()))?;
        let stderr_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

        let subscriber = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(false)
                    .with_filter(file_level),
            )
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_filter(stderr_filter),
            );

        Ok(Self {
            dispatch: Dispatch::new(subscriber),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `f` with this log as the current thread's dispatcher.
    pub fn scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn scoped_events_reach_the_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("logs/run.log");

        let log = RunLog::create(&path, "info").unwrap();
        log.scope(|| {
            tracing::info!("converted a.jpg");
            tracing::debug!("below the file level");
        });

        let content = fs::read_to_string(log.path()).unwrap();
        assert!(content.contains("converted a.jpg"));
        assert!(!content.contains("below the file level"));
    }

    #[test]
    fn events_outside_scope_are_not_logged() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("run.log");

        let log = RunLog::create(&path, "trace").unwrap();
        tracing::info!("outside");
        log.scope(|| tracing::info!("inside"));

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("inside"));
        assert!(!content.contains("outside"));
    }

    #[test]
    fn rejects_unknown_level() {
        let tmp = TempDir::new().unwrap();
        let result = RunLog::create(&tmp.path().join("run.log"), "chatty");
        assert!(matches!(result, Err(LogError::Level(_))));
    }
}
