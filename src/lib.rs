//! Configurable reverse HTTP proxy library.
//!
//! Requests are matched against routing entries by exact path; a matched
//! route can rewrite the method, turn query parameters into a JSON or
//! form-urlencoded body, and replace or append response headers. Everything
//! is forwarded to one fixed upstream target.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;
pub mod transform;

pub use config::ProxyConfig;
pub use error::ProxyError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use net::Listeners;
