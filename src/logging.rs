//! Logging setup for the `macross` binary.
//!
//! Logs go to stderr so that report output on stdout stays machine-readable.
//! `RUST_LOG` overrides the level chosen on the command line.

use clap::ValueEnum;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

fn build_filter(log_level: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Installs the global subscriber. Safe to call more than once; later calls are no-ops.
pub fn init_logging(log_level: &str, log_format: LogFormat) {
    let subscriber = tracing_subscriber::registry().with(build_filter(log_level));

    match log_format {
        LogFormat::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_target(true);
            let _ = subscriber.with(fmt_layer).try_init();
        }
        LogFormat::Pretty => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false);
            let _ = subscriber.with(fmt_layer).try_init();
        }
    }

    tracing::debug!(log_level, ?log_format, "logging initialized");
}
