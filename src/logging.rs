use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::{
    non_blocking,
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{
    filter::{LevelFilter, Targets},
    fmt::Layer,
    prelude::*,
};

const MAX_DAYS: usize = 2;

/// Keeps the non-blocking writers flushing until dropped at the end of `main`.
#[must_use]
pub struct LogGuard {
    _guards: Vec<WorkerGuard>,
}

/// Logs this crate at `level` (everything else at WARN) to a daily file in
/// `log_dir`. With `to_stderr`, warnings and errors are also echoed to stderr;
/// the terminal front ends leave it off since they own the screen.
pub fn init_logging(log_dir: &Path, level: LevelFilter, to_stderr: bool) -> Result<LogGuard> {
    let log_file = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("simplecalc")
        .filename_suffix("log")
        .max_log_files(MAX_DAYS)
        .build(log_dir)
        .with_context(|| format!("cannot open log directory {}", log_dir.display()))?;

    let (log_file, file_guard) = non_blocking(log_file);
    let mut guards = vec![file_guard];

    let file_layer = Layer::new()
        .with_ansi(false)
        .with_writer(log_file)
        .with_filter(
            Targets::new()
                .with_default(LevelFilter::WARN)
                .with_target(env!("CARGO_CRATE_NAME"), level),
        );

    let stderr_layer = if to_stderr {
        let (stderr, stderr_guard) = non_blocking(std::io::stderr());
        guards.push(stderr_guard);
        Some(
            Layer::new()
                .with_ansi(true)
                .with_writer(stderr)
                .with_filter(Targets::new().with_default(LevelFilter::WARN)),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .context("logging already initialized")?;

    Ok(LogGuard { _guards: guards })
}
