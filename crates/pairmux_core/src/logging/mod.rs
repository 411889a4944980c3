//! Logging infrastructure for pairmux.
//!
//! This module provides:
//! - A per-run logger with file + callback output
//! - Pair-scoped loggers with their own tool-output tail buffer
//! - Integration with the `tracing` ecosystem
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use pairmux_core::logging::{LogConfig, RunLogger};
//!
//! let logger = Arc::new(RunLogger::new("batch", "/tmp/logs", LogConfig::default(), None).unwrap());
//! logger.phase("Processing pairs");
//!
//! let pair = logger.scope("000_intro_1a2b3c4d");
//! pair.stage("Normalize");
//! pair.command("ffmpeg -i in.mp4 ...");
//! pair.success("Normalized");
//! ```

mod run_logger;
mod types;

pub use run_logger::{RunLogger, ScopedLogger};
pub use types::{LineCallback, LogConfig, LogLevel, MessagePrefix};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the global tracing subscriber.
///
/// Respects `RUST_LOG`, falling back to `default_level`. Output goes to
/// stderr. Call once at startup.
pub fn init_tracing(default_level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_to_filter_str(default_level)));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

/// Initialize tracing for tests (only logs warnings and above).
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}

fn level_to_filter_str(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Trace => "trace",
        LogLevel::Debug => "debug",
        LogLevel::Info => "info",
        LogLevel::Warn => "warn",
        LogLevel::Error => "error",
    }
}
