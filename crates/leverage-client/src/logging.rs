//! Tracing setup for the `leverage-client` binary.
//!
//! Stdout is reserved for command results, so events never go there. Every
//! event is written as a JSON line to a daily-rolling file under
//! `logging.log_dir`; a compact copy goes to stderr unless `logging.stderr`
//! is off.

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Filter applied when neither `RUST_LOG` nor `logging.filter` is set.
pub const DEFAULT_FILTER: &str = "leverage_client=info,warn";

/// Pick the filter directive: `RUST_LOG`, then `logging.filter`, then
/// [`DEFAULT_FILTER`]. Blank values count as unset.
pub fn filter_directive(rust_log: Option<&str>, logging: &LoggingConfig) -> String {
    let non_blank = |v: &&str| !v.trim().is_empty();
    rust_log
        .filter(non_blank)
        .or(logging.filter.as_deref().filter(non_blank))
        .unwrap_or(DEFAULT_FILTER)
        .to_string()
}

/// Install the global subscriber. Hold the returned [`WorkerGuard`] until
/// exit; dropping it flushes the file writer.
pub fn init_tracing(logging: &LoggingConfig) -> Result<WorkerGuard> {
    std::fs::create_dir_all(&logging.log_dir)
        .with_context(|| format!("creating log directory {}", logging.log_dir))?;

    let (file_writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(
        &logging.log_dir,
        &logging.log_file,
    ));

    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directive = filter_directive(rust_log.as_deref(), logging);
    let filter = EnvFilter::try_new(&directive)
        .with_context(|| format!("invalid log filter {directive:?}"))?;

    let stderr_layer = logging.stderr.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .compact()
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .json(),
        )
        .with(stderr_layer)
        .try_init()
        .context("tracing subscriber already installed")?;

    Ok(guard)
}
