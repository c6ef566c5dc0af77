//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request pipeline produces:
//!     → logging.rs (structured log events: inbound trace, route activation, summary)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout or the configured log file
//!     → Metrics endpoint (Prometheus scrape), when enabled
//! ```

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
