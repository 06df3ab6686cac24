//! Tracing setup: console output plus a daily-rolling JSON log file.

use std::path::Path;

use tracing::warn;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is not set.
pub(crate) const DEFAULT_FILTER: &str = "obs_tally=debug,obs_tally_core=debug";

/// Build the env filter, preferring `RUST_LOG`.
pub(crate) fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber.
///
/// With a `log_dir` a daily file layer is added next to the console; the
/// returned guard flushes it and must be held until exit. If the file cannot
/// be opened the console layer is installed alone.
pub(crate) fn init(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let console = fmt::layer().with_target(true);

    let appender = log_dir.map(|dir| {
        RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix("obs-tally")
            .filename_suffix("log")
            .build(dir)
    });

    match appender {
        Some(Ok(appender)) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file = fmt::layer().json().with_writer(writer).with_ansi(false);

            tracing_subscriber::registry()
                .with(env_filter())
                .with(console)
                .with(file)
                .init();

            Some(guard)
        }
        Some(Err(e)) => {
            tracing_subscriber::registry()
                .with(env_filter())
                .with(console)
                .init();
            warn!(error = %e, "File logging disabled");
            None
        }
        None => {
            tracing_subscriber::registry()
                .with(env_filter())
                .with(console)
                .init();
            None
        }
    }
}
