//! Log setup.
//!
//! Everything logs through `tracing`. A run writes to
//! `LogPath/<LogName formatted with the current time>` when `LogName` is set,
//! and to stderr when `LogConsole` is set or there is no log file. `RUST_LOG`
//! overrides the level; otherwise it is `info`, or `debug` for verbose runs.

use crate::config::ThumbnailConfig;
use crate::timestamp::FileDateTime;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

#[derive(Error, Debug)]
pub enum LogError {
    #[error("cannot open log file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("logging is already set up: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Filter used when `RUST_LOG` is unset. Verbose runs keep the per-entry
/// EXIF dump quiet; `dump --debug` asks for it explicitly.
pub fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "debug,thumbscan::exif=info"
    } else {
        "info"
    }
}

fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Open `path` for appending, creating it if needed.
pub fn open_log_file(path: &Path) -> Result<File, LogError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LogError::Open {
            path: path.to_path_buf(),
            source,
        })
}

/// Install the subscriber for a run. Returns the log file in use, if any.
pub fn init(config: &ThumbnailConfig) -> Result<Option<PathBuf>, LogError> {
    let log_file = config.log_file(&FileDateTime::now());
    let file_layer = match &log_file {
        Some(path) => Some(
            fmt::layer()
                .with_writer(Mutex::new(open_log_file(path)?))
                .with_ansi(false)
                .with_target(false),
        ),
        None => None,
    };
    let console_layer = (log_file.is_none() || config.log_console).then(|| {
        fmt::layer()
            .with_writer(io::stderr)
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(env_filter(default_directives(config.verbose)))
        .with(file_layer)
        .with(console_layer)
        .try_init()?;
    Ok(log_file)
}

/// Install a stderr-only subscriber with the given fallback filter.
pub fn init_console(fallback: &str) -> Result<(), LogError> {
    tracing_subscriber::registry()
        .with(env_filter(fallback))
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .try_init()?;
    Ok(())
}
