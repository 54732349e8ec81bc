//! Tracing setup: terse stderr output plus a daily rolling log file.

use screenrec_types::logging::{ensure_log_dir, LOG_FILE_PREFIX};
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber.
///
/// The file log honours `RUST_LOG` (default `info`). Stderr shows warnings,
/// or debug output with `--verbose`, or errors only with `--quiet`.
/// Keep the returned guard alive until exit so buffered lines are flushed.
pub fn init(verbose: bool, quiet: bool) -> Option<WorkerGuard> {
    let stderr_level = if verbose {
        LevelFilter::DEBUG
    } else if quiet {
        LevelFilter::ERROR
    } else {
        LevelFilter::WARN
    };
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(stderr_level);

    match ensure_log_dir() {
        Ok(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file_filter =
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
            let file_layer = fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(file_filter);
            tracing_subscriber::registry()
                .with(stderr_layer)
                .with(file_layer)
                .init();
            Some(guard)
        }
        Err(e) => {
            tracing_subscriber::registry().with(stderr_layer).init();
            tracing::warn!("File logging disabled: {}", e);
            None
        }
    }
}
