//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (raw path + query, as received)
//!     → resolver.rs (exact path lookup, parameter capture)
//!     → Return: active ResolvedRoute or inactive default
//!     → method.rs (guarded method rewrite)
//!
//! Route Compilation (at startup):
//!     RoutingEntry[]
//!     → Strip query fragments from configured paths
//!     → Freeze as immutable RouteResolver
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Resolution is a read-only scan producing a new value per request
//! - Deterministic: same input always matches same route
//! - First match wins (declared order)

pub mod method;
pub mod resolver;

pub use method::rewrite_method;
pub use resolver::{ResolvedRoute, RouteResolver};
