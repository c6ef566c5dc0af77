//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (ports, timeouts)
//! - Check route methods and header rules are usable at request time
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use axum::http::{HeaderName, HeaderValue};
use thiserror::Error;
use url::Url;

use crate::config::schema::{ProxyConfig, RoutingEntry};

/// Methods a route may rewrite from or to.
pub const ALLOWED_METHODS: [&str; 4] = ["GET", "POST", "PUT", "PATCH"];

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("target_url {url:?} is invalid: {reason}")]
    TargetUrl { url: String, reason: String },

    #[error("{field} {value:?} is not a valid port")]
    Port { field: &'static str, value: String },

    #[error("tls.{field} must not be empty")]
    TlsPath { field: &'static str },

    #[error("route {path:?}: path must start with '/'")]
    RoutePath { path: String },

    #[error("route {path:?}: method type {method:?} is not allowed")]
    Method { path: String, method: String },

    #[error("route {path:?}: invalid header name {key:?}")]
    HeaderName { path: String, key: String },

    #[error("route {path:?}: invalid value for header {key:?}")]
    HeaderValue { path: String, key: String },

    #[error("timeouts.upstream_secs must be greater than zero")]
    UpstreamTimeout,
}

/// Validate a freshly parsed configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match Url::parse(&config.target_url) {
        Ok(url) if url.scheme() != "http" => errors.push(ValidationError::TargetUrl {
            url: config.target_url.clone(),
            reason: format!("unsupported scheme {:?}, expected http", url.scheme()),
        }),
        Ok(url) if url.host_str().is_none() => errors.push(ValidationError::TargetUrl {
            url: config.target_url.clone(),
            reason: "missing host".to_string(),
        }),
        Ok(_) => {}
        Err(e) => errors.push(ValidationError::TargetUrl {
            url: config.target_url.clone(),
            reason: e.to_string(),
        }),
    }

    check_port("listening_port", &config.listening_port, &mut errors);

    if let Some(tls) = config.active_tls() {
        check_port("tls.listening_port", &tls.listening_port, &mut errors);
        if tls.cert_file.trim().is_empty() {
            errors.push(ValidationError::TlsPath { field: "cert_file" });
        }
        if tls.key_file.trim().is_empty() {
            errors.push(ValidationError::TlsPath { field: "key_file" });
        }
    }

    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::UpstreamTimeout);
    }

    for route in &config.routes {
        check_route(route, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_port(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    if value.parse::<u16>().is_err() {
        errors.push(ValidationError::Port {
            field,
            value: value.to_string(),
        });
    }
}

fn check_route(route: &RoutingEntry, errors: &mut Vec<ValidationError>) {
    if !route.path.starts_with('/') {
        errors.push(ValidationError::RoutePath {
            path: route.path.clone(),
        });
    }

    for method in [&route.from_method, &route.to_method] {
        if !method.is_empty() && !ALLOWED_METHODS.contains(&method.as_str()) {
            errors.push(ValidationError::Method {
                path: route.path.clone(),
                method: method.clone(),
            });
        }
    }

    for rule in &route.custom_headers {
        if HeaderName::from_bytes(rule.key.as_bytes()).is_err() {
            errors.push(ValidationError::HeaderName {
                path: route.path.clone(),
                key: rule.key.clone(),
            });
        } else if HeaderValue::from_str(&rule.joined_values()).is_err() {
            errors.push(ValidationError::HeaderValue {
                path: route.path.clone(),
                key: rule.key.clone(),
            });
        }
    }
}
