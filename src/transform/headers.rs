//! Header composition for the downstream response.
//!
//! Stages describe what they want done to the response headers as an
//! ordered list of [`HeaderMutation`]s. The list is applied once, after the
//! upstream headers have been copied onto the response.

use axum::http::{HeaderMap, HeaderName, HeaderValue};

use crate::routing::ResolvedRoute;

/// Response header the upstream host is reported under.
pub const REQUESTED_HOST: &str = "requested-host";

/// One change to a header map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderMutation {
    /// Discard every existing value and store `value`.
    Set { name: HeaderName, value: HeaderValue },
    /// Join `value` onto whatever is stored, separated by ", ".
    Append { name: HeaderName, value: HeaderValue },
    /// Store `value` as an additional entry, keeping existing ones.
    Add { name: HeaderName, value: HeaderValue },
}

impl HeaderMutation {
    pub fn name(&self) -> &HeaderName {
        match self {
            HeaderMutation::Set { name, .. }
            | HeaderMutation::Append { name, .. }
            | HeaderMutation::Add { name, .. } => name,
        }
    }
}

/// Mutations requested by the route's custom header rules, in rule order.
///
/// Rules whose name or value cannot be represented are skipped with a
/// warning; the loader rejects them, so this only happens for configs
/// built in code.
pub fn compose(route: &ResolvedRoute<'_>) -> Vec<HeaderMutation> {
    if !route.is_active() {
        return Vec::new();
    }

    route
        .custom_headers()
        .iter()
        .filter_map(|rule| {
            let name = HeaderName::from_bytes(rule.key.as_bytes()).ok();
            let value = HeaderValue::from_str(&rule.joined_values()).ok();
            match (name, value) {
                (Some(name), Some(value)) if rule.replace => {
                    Some(HeaderMutation::Set { name, value })
                }
                (Some(name), Some(value)) => Some(HeaderMutation::Append { name, value }),
                _ => {
                    tracing::warn!(header = %rule.key, "Skipping unusable custom header rule");
                    None
                }
            }
        })
        .collect()
}

/// Apply mutations in order. Later mutations see the effect of earlier ones.
pub fn apply(headers: &mut HeaderMap, mutations: &[HeaderMutation]) {
    for mutation in mutations {
        match mutation {
            HeaderMutation::Set { name, value } => {
                headers.insert(name.clone(), value.clone());
            }
            HeaderMutation::Append { name, value } => {
                let combined = match joined(headers, name) {
                    Some(mut existing) => {
                        existing.extend_from_slice(b", ");
                        existing.extend_from_slice(value.as_bytes());
                        HeaderValue::from_bytes(&existing).unwrap_or_else(|_| value.clone())
                    }
                    None => value.clone(),
                };
                headers.insert(name.clone(), combined);
            }
            HeaderMutation::Add { name, value } => {
                headers.append(name.clone(), value.clone());
            }
        }
    }
}

/// All values stored under `name`, joined with ", ".
fn joined(headers: &HeaderMap, name: &HeaderName) -> Option<Vec<u8>> {
    let mut values = headers.get_all(name).iter();
    let mut out = values.next()?.as_bytes().to_vec();
    for value in values {
        out.extend_from_slice(b", ");
        out.extend_from_slice(value.as_bytes());
    }
    Some(out)
}
