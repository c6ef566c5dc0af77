//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! ProxyConfig
//!     → listener.rs (bind plain port, bind TLS port when enabled)
//!     → tls.rs (load PEM certificate + key)
//!     → serve_plain / serve_tls (one task each)
//!     → Hand off to HTTP layer (same router on both)
//! ```
//!
//! # Design Decisions
//! - TLS is optional and independent of the plain listener
//! - Bind errors surface before any traffic is served

pub mod listener;
pub mod tls;

pub use listener::{serve_plain, serve_tls, ListenerError, Listeners, TlsListener};
