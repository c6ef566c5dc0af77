//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once at startup
//! - Route output to stdout or to the configured log file
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level
//! - A log file that cannot be opened falls back to stdout; logging never
//!   stops the proxy from serving

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ProxyConfig;

/// Default filter for a configured level.
pub fn default_filter(level: &str) -> String {
    format!("transform_proxy={level},tower_http={level}")
}

/// Install the global subscriber. Calling it twice is harmless.
pub fn init_logging(config: &ProxyConfig) {
    let filter = || {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| default_filter(&config.observability.log_level).into())
    };

    let Some(path) = config.log_file.as_deref() else {
        let _ = tracing_subscriber::registry()
            .with(filter())
            .with(tracing_subscriber::fmt::layer())
            .try_init();
        return;
    };

    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => {
            let _ = tracing_subscriber::registry()
                .with(filter())
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .try_init();
        }
        Err(e) => {
            let _ = tracing_subscriber::registry()
                .with(filter())
                .with(tracing_subscriber::fmt::layer())
                .try_init();
            tracing::warn!(path = %path, error = %e, "Failed to open log file, logging to stdout");
        }
    }
}
