//! Per-request error types.
//!
//! Every failure inside the request pipeline ends up here and is turned into
//! a response for that request only. Startup failures use
//! [`ConfigError`](crate::config::ConfigError) and
//! [`ListenerError`](crate::net::ListenerError) instead.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Errors that can occur while proxying a single request.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Target URL plus request URI did not form a valid URL (500).
    #[error("invalid upstream URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Outbound request could not be assembled (500).
    #[error("failed to build upstream request: {0}")]
    Request(#[from] axum::http::Error),

    /// Query parameters could not be serialized into a body (500).
    #[error("failed to serialize parameters: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Connection-level failure talking to the upstream (502).
    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),

    /// Upstream did not answer within the configured deadline (504).
    #[error("upstream timed out after {0} seconds")]
    Timeout(u64),

    /// Upstream response body could not be read or was too large (502).
    #[error("failed to read upstream response body: {0}")]
    ResponseBody(String),
}

/// Result type alias for proxy operations.
pub type ProxyResult<T> = Result<T, ProxyError>;

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::InvalidUrl { .. } | ProxyError::Request(_) | ProxyError::Serialize(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ProxyError::Upstream(_) | ProxyError::ResponseBody(_) => StatusCode::BAD_GATEWAY,
            ProxyError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Whether the upstream itself failed, as opposed to the proxy.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            ProxyError::Upstream(_) | ProxyError::Timeout(_) | ProxyError::ResponseBody(_)
        )
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::InvalidUrl { .. } => "invalid_url",
            ProxyError::Request(_) => "request",
            ProxyError::Serialize(_) => "serialize",
            ProxyError::Upstream(_) => "upstream",
            ProxyError::Timeout(_) => "timeout",
            ProxyError::ResponseBody(_) => "response_body",
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let message = match self.status() {
            StatusCode::BAD_GATEWAY => "Upstream request failed",
            StatusCode::GATEWAY_TIMEOUT => "Upstream request timed out",
            _ => "Failed to proxy request",
        };
        (self.status(), message).into_response()
    }
}
