//! Shared logging utilities for BriefCheck binaries.
//!
//! File output rotates daily under `~/.briefcheck/logs` through a
//! non-blocking background writer; stderr stays quiet unless `--verbose`.
//! Every event inside a job run carries the job id via [`job_span`], so one
//! `grep job_id=` over the log files reconstructs a job's history across
//! pipeline stages and workers.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing::Span;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str = "briefcheck=info,briefcheck_worker=info,briefcheck_verify=info";

/// Logging configuration shared by BriefCheck binaries.
pub struct LogConfig<'a> {
    pub app_name: &'a str,
    pub verbose: bool,
}

/// Keeps the background log writer flushing; hold it for the life of the
/// process (dropping it loses buffered log lines).
pub struct LogGuard {
    _writer: WorkerGuard,
}

/// Initialize tracing with a daily-rotated file writer and stderr output.
pub fn init_logging(config: LogConfig<'_>) -> Result<LogGuard> {
    let log_dir = ensure_logs_dir().context("Failed to ensure log directory")?;
    let file_appender =
        tracing_appender::rolling::daily(&log_dir, format!("{}.log", config.app_name));
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let console_filter = if config.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_filter(file_filter),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        )
        .init();

    Ok(LogGuard { _writer: guard })
}

/// Span wrapping one job's pipeline run. Workers and the sync path both
/// enter it, so log lines from extraction through assembly correlate by
/// `job_id` no matter where the job executed.
pub fn job_span(job_id: &str) -> Span {
    tracing::info_span!("job", job_id = %job_id)
}

/// Get the BriefCheck home directory: ~/.briefcheck
pub fn briefcheck_home() -> PathBuf {
    if let Ok(override_path) = std::env::var("BRIEFCHECK_HOME") {
        return PathBuf::from(override_path);
    }
    dirs::home_dir()
        .expect("Could not determine home directory")
        .join(".briefcheck")
}

/// Get the logs directory: ~/.briefcheck/logs
pub fn logs_dir() -> PathBuf {
    briefcheck_home().join("logs")
}

/// Ensure the logs directory exists.
pub fn ensure_logs_dir() -> Result<PathBuf> {
    let logs = logs_dir();
    fs::create_dir_all(&logs)
        .with_context(|| format!("Failed to create logs directory: {}", logs.display()))?;
    Ok(logs)
}
