//! Outbound method rewriting.
//!
//! The rewrite is guarded: the inbound method must equal the route's
//! `from_method` before `to_method` is applied.

use axum::http::Method;

use crate::routing::resolver::ResolvedRoute;

/// Pick the method for the outbound request.
pub fn rewrite_method(inbound: &Method, route: &ResolvedRoute<'_>) -> Method {
    let (from, to) = (route.from_method(), route.to_method());

    if !route.is_active() || from.is_empty() || to.is_empty() {
        return inbound.clone();
    }

    if inbound.as_str() != from {
        return inbound.clone();
    }

    match Method::from_bytes(to.as_bytes()) {
        Ok(method) => {
            tracing::debug!(from = %inbound, to = %method, "Rewriting request method");
            method
        }
        Err(_) => {
            tracing::warn!(to_method = %to, "Ignoring invalid to_method");
            inbound.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RoutingEntry;
    use crate::routing::RouteResolver;

    fn resolver(from: &str, to: &str) -> RouteResolver {
        RouteResolver::from_config(&[RoutingEntry {
            path: "/r".into(),
            from_method: from.into(),
            to_method: to.into(),
            ..RoutingEntry::default()
        }])
    }

    fn matched(resolver: &RouteResolver) -> ResolvedRoute<'_> {
        resolver.resolve(&"/r".parse().unwrap())
    }

    #[test]
    fn rewrites_when_inbound_matches_from() {
        let r = resolver("GET", "POST");
        assert_eq!(rewrite_method(&Method::GET, &matched(&r)), Method::POST);
    }

    #[test]
    fn leaves_other_methods_alone() {
        let r = resolver("GET", "POST");
        assert_eq!(rewrite_method(&Method::PUT, &matched(&r)), Method::PUT);
    }

    #[test]
    fn empty_fields_disable_rewrite() {
        let r = resolver("", "POST");
        assert_eq!(rewrite_method(&Method::GET, &matched(&r)), Method::GET);

        let r = resolver("GET", "");
        assert_eq!(rewrite_method(&Method::GET, &matched(&r)), Method::GET);
    }

    #[test]
    fn inactive_route_is_noop() {
        let route = ResolvedRoute::inactive();
        assert_eq!(rewrite_method(&Method::PATCH, &route), Method::PATCH);
    }
}
