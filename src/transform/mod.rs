//! Request and response transformations driven by the resolved route.
//!
//! # Data Flow
//! ```text
//! ResolvedRoute
//!     → params.rs (query parameters → replacement request body)
//!     → headers.rs (custom header rules → ordered response header mutations)
//! ```
//!
//! Both stages are pure with respect to the configuration: they read the
//! route and produce values, never touching shared state.

pub mod headers;
pub mod params;

pub use headers::{HeaderMutation, REQUESTED_HOST};
pub use params::{BodyEncoding, Parameters, ProjectedBody, Projection};
