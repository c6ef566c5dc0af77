//! Route lookup.
//!
//! # Responsibilities
//! - Store the configured routing entries in declared order
//! - Find the entry whose path equals the request path
//! - Capture the request's query parameters for later stages
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Exact path equality only: no prefixes, wildcards or regex
//! - First match wins when paths are duplicated
//! - No match yields an inactive route rather than an error

use axum::http::Uri;

use crate::config::{CustomHeaderRule, RoutingEntry};
use crate::transform::params::Parameters;

/// A routing entry with its comparison key precomputed.
#[derive(Debug, Clone)]
struct CompiledRoute {
    match_path: String,
    entry: RoutingEntry,
}

/// Resolves inbound requests to routing entries.
#[derive(Debug, Clone, Default)]
pub struct RouteResolver {
    routes: Vec<CompiledRoute>,
}

impl RouteResolver {
    /// Compile the configured entries, keeping their order.
    pub fn from_config(entries: &[RoutingEntry]) -> Self {
        let routes = entries
            .iter()
            .map(|entry| CompiledRoute {
                match_path: strip_query(&entry.path).to_string(),
                entry: entry.clone(),
            })
            .collect();

        Self { routes }
    }

    /// Number of configured routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Match the inbound request URI.
    ///
    /// The raw path is compared as received. Dot segments and percent
    /// escapes are not resolved, so `/x/../a` never matches `/a`.
    pub fn resolve(&self, request: &Uri) -> ResolvedRoute<'_> {
        let path = request.path();

        self.routes
            .iter()
            .find(|route| route.match_path == path)
            .map(|route| ResolvedRoute {
                entry: Some(&route.entry),
                parameters: Parameters::parse(request.query().unwrap_or_default()),
            })
            .unwrap_or_default()
    }
}

fn strip_query(path: &str) -> &str {
    path.split('?').next().unwrap_or(path)
}

/// Outcome of matching one request. Inactive when nothing matched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedRoute<'a> {
    entry: Option<&'a RoutingEntry>,
    parameters: Parameters,
}

impl<'a> ResolvedRoute<'a> {
    /// The no-op route.
    pub fn inactive() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.entry.is_some()
    }

    /// The configured path of the matched entry.
    pub fn path(&self) -> Option<&'a str> {
        self.entry.map(|e| e.path.as_str())
    }

    pub fn from_method(&self) -> &'a str {
        self.entry.map(|e| e.from_method.as_str()).unwrap_or_default()
    }

    pub fn to_method(&self) -> &'a str {
        self.entry.map(|e| e.to_method.as_str()).unwrap_or_default()
    }

    pub fn copy_parameters(&self) -> bool {
        self.entry.map(|e| e.copy_parameters).unwrap_or(false)
    }

    pub fn custom_headers(&self) -> &'a [CustomHeaderRule] {
        self.entry.map(|e| e.custom_headers.as_slice()).unwrap_or_default()
    }

    /// Query parameters of the current request. Empty when inactive.
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }
}
