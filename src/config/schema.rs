//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.
//! Field aliases accept the key names used by older JSON config files
//! (`uri`, `copy_paramaters`, `header_key`, `header_values`, `routing_options`).

use serde::{Deserialize, Serialize};

/// Root configuration for the proxy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Upstream base URL every request is forwarded to (e.g. "http://localhost:14200").
    pub target_url: String,

    /// Address the plaintext listener binds to.
    pub listening_host: String,

    /// Port of the plaintext listener.
    pub listening_port: String,

    /// Optional encrypted listener.
    pub tls: Option<TlsConfig>,

    /// Routing entries, scanned in declared order.
    #[serde(alias = "routing_options")]
    pub routes: Vec<RoutingEntry>,

    /// Write logs to this file instead of stdout.
    pub log_file: Option<String>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Resource limits.
    pub limits: LimitConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            target_url: "http://localhost:8081".to_string(),
            listening_host: "127.0.0.1".to_string(),
            listening_port: "8080".to_string(),
            tls: None,
            routes: Vec::new(),
            log_file: None,
            timeouts: TimeoutConfig::default(),
            limits: LimitConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl ProxyConfig {
    /// The encrypted listener settings, if present and switched on.
    pub fn active_tls(&self) -> Option<&TlsConfig> {
        self.tls.as_ref().filter(|tls| tls.enabled)
    }
}

/// TLS configuration for the encrypted listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Start the encrypted listener.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Path to certificate file (PEM).
    pub cert_file: String,

    /// Path to private key file (PEM).
    pub key_file: String,

    /// Port of the encrypted listener.
    pub listening_port: String,
}

fn default_true() -> bool {
    true
}

/// A configured rule mapping a request path to transformations.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct RoutingEntry {
    /// Exact path to match. Anything after `?` is ignored.
    #[serde(alias = "uri")]
    pub path: String,

    /// Inbound method that triggers the rewrite. Empty disables rewriting.
    #[serde(default)]
    pub from_method: String,

    /// Outbound method to use. Empty disables rewriting.
    #[serde(default)]
    pub to_method: String,

    /// Project query parameters into the outbound request body.
    #[serde(default, alias = "copy_paramaters")]
    pub copy_parameters: bool,

    /// Header rules applied to the response, in order.
    #[serde(default)]
    pub custom_headers: Vec<CustomHeaderRule>,
}

/// A replace/append rule for one response header.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct CustomHeaderRule {
    /// Overwrite the header instead of appending to it.
    #[serde(default)]
    pub replace: bool,

    #[serde(alias = "header_key")]
    pub key: String,

    #[serde(default, alias = "header_values")]
    pub values: Vec<String>,
}

impl CustomHeaderRule {
    /// Values joined the way they appear on the wire.
    pub fn joined_values(&self) -> String {
        self.values.join(", ")
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upper bound on a full upstream round trip in seconds.
    pub upstream_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { upstream_secs: 30 }
    }
}

/// Resource limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitConfig {
    /// Largest upstream response body that will be buffered.
    pub max_response_body_bytes: usize,
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            max_response_body_bytes: 16 * 1024 * 1024, // 16MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
