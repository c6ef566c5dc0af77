//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Plain or TLS connection
//!     → server.rs (Axum setup, catch-all handler, pipeline)
//!     → request.rs (request ID, inbound details)
//!     → [routing resolves route, rewrites method]
//!     → [transform projects parameters into the body]
//!     → upstream.rs (build outbound request, round trip, buffer body)
//!     → response.rs (copy upstream headers, apply mutations)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;
pub mod upstream;

pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
pub use upstream::UpstreamClient;
