//! HTTP server setup and the request pipeline.
//!
//! # Responsibilities
//! - Create the Axum Router with one catch-all handler
//! - Wire up middleware (tracing, request ID)
//! - Run the pipeline for every request:
//!   resolve route → rewrite method → project parameters → dispatch
//!   upstream → compose response headers
//! - Start the plain and TLS listeners as independent tasks
//!
//! # Design Decisions
//! - Config is shared read-only through `Arc`; requests share no mutable state
//! - Failures are contained to the request and answered with 5xx

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, HeaderValue, Request},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::error::ProxyResult;
use crate::http::request::{inbound_host, request_id, UuidRequestId};
use crate::http::response::into_downstream;
use crate::http::upstream::{build_request, OutboundBody, UpstreamClient, UpstreamTarget};
use crate::lifecycle::Shutdown;
use crate::net::{serve_plain, serve_tls, ListenerError, Listeners};
use crate::observability::metrics;
use crate::routing::{rewrite_method, RouteResolver};
use crate::transform::headers::{self, HeaderMutation, REQUESTED_HOST};
use crate::transform::params::{self, Projection};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ProxyConfig>,
    pub resolver: Arc<RouteResolver>,
    pub upstream: UpstreamClient,
    /// Scheme of the listener this router serves, for logging.
    pub scheme: &'static str,
}

/// HTTP server for the proxy.
pub struct HttpServer {
    config: Arc<ProxyConfig>,
    resolver: Arc<RouteResolver>,
    upstream: UpstreamClient,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Self {
        let resolver = Arc::new(RouteResolver::from_config(&config.routes));
        let upstream = UpstreamClient::new(&config);

        tracing::info!(
            target_url = %config.target_url,
            routes = resolver.len(),
            "Proxy pipeline initialized"
        );

        Self {
            config: Arc::new(config),
            resolver,
            upstream,
        }
    }

    /// Build the Axum router for a listener serving `scheme`.
    pub fn router(&self, scheme: &'static str) -> Router {
        let state = AppState {
            config: Arc::clone(&self.config),
            resolver: Arc::clone(&self.resolver),
            upstream: self.upstream.clone(),
            scheme,
        };

        Router::new()
            .route("/", any(proxy_handler))
            .route("/{*path}", any(proxy_handler))
            .with_state(state)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
    }

    /// Serve on the bound listeners until shutdown.
    ///
    /// Both listeners run as separate tasks. A listener that fails is
    /// logged right away and the other keeps serving. Once both have
    /// stopped, the plain listener's error is returned, else the TLS one.
    pub async fn run(self, listeners: Listeners, shutdown: &Shutdown) -> Result<(), ListenerError> {
        let Listeners { plain, tls } = listeners;

        let plain_task = tokio::spawn(serve_plain(
            plain,
            self.router("http"),
            shutdown.subscribe(),
        ));
        let tls_task = tls.map(|tls| {
            tokio::spawn(serve_tls(tls, self.router("https"), shutdown.subscribe()))
        });

        let result = join_listeners(plain_task, tls_task).await;
        tracing::info!("HTTP server stopped");
        result
    }
}

type ListenerTask = tokio::task::JoinHandle<Result<(), ListenerError>>;

/// Wait for both listener tasks. Each failure is logged as soon as it
/// happens; the plain result takes precedence in the return value.
async fn join_listeners(
    plain: ListenerTask,
    tls: Option<ListenerTask>,
) -> Result<(), ListenerError> {
    let tls = async move {
        match tls {
            Some(task) => join_listener("tls", task).await,
            None => Ok(()),
        }
    };

    let (plain_result, tls_result) = tokio::join!(join_listener("plain", plain), tls);
    plain_result.and(tls_result)
}

async fn join_listener(listener: &'static str, task: ListenerTask) -> Result<(), ListenerError> {
    let result = task.await.unwrap_or_else(|e| {
        Err(ListenerError::Task {
            listener,
            reason: e.to_string(),
        })
    });
    if let Err(e) = &result {
        tracing::error!(listener, error = %e, "Listener stopped with an error");
    }
    result
}

/// Main proxy handler.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let method = request.method().to_string();
    let request_id = request_id(request.headers()).to_string();

    match forward(&state, &request_id, request).await {
        Ok((response, route)) => {
            metrics::record_request(&method, response.status().as_u16(), &route, start_time);
            response
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Failed to proxy request");
            if e.is_upstream() {
                metrics::record_upstream_error(e.kind());
            }
            metrics::record_request(&method, e.status().as_u16(), "none", start_time);
            e.into_response()
        }
    }
}

/// Run the pipeline for one request. Returns the response and the matched
/// route path ("none" when no route matched).
async fn forward(
    state: &AppState,
    request_id: &str,
    request: Request<Body>,
) -> ProxyResult<(Response, String)> {
    let (parts, body) = request.into_parts();

    tracing::info!(
        request_id = %request_id,
        method = %parts.method,
        scheme = state.scheme,
        host = %inbound_host(&parts),
        path = %parts.uri.path(),
        "Incoming request"
    );

    // 1. Resolve route
    let target = UpstreamTarget::new(&state.config.target_url, &parts.uri)?;
    let route = state.resolver.resolve(&parts.uri);
    if route.is_active() {
        tracing::info!(
            request_id = %request_id,
            route = route.path().unwrap_or_default(),
            url = %target.uri,
            "Handling custom route"
        );
    }

    // 2. Rewrite method
    let method = rewrite_method(&parts.method, &route);

    // 3. Project parameters into the body
    let body = match params::project(&route)? {
        Projection::Replaced(projected) => {
            metrics::record_projection(projected.encoding.as_str());
            OutboundBody::Buffered(projected.raw.into())
        }
        Projection::Unchanged | Projection::Unsupported(_) => OutboundBody::Inbound(body),
    };

    // 4. Dispatch upstream
    let outbound = build_request(method.clone(), &target.uri, &parts.headers, body)?;
    let upstream = state.upstream.send(outbound).await?;
    let status = upstream.parts.status;

    // 5. Compose response headers
    let mut mutations = Vec::with_capacity(route.custom_headers().len() + 1);
    if let Ok(value) = HeaderValue::from_str(&target.requested_host()) {
        mutations.push(HeaderMutation::Add {
            name: HeaderName::from_static(REQUESTED_HOST),
            value,
        });
    }
    mutations.extend(headers::compose(&route));

    let response = into_downstream(upstream, &mutations);

    tracing::info!(
        request_id = %request_id,
        method = %method,
        url = %target.uri,
        status = status.as_u16(),
        "Proxied request"
    );

    let route_label = route.path().unwrap_or("none").to_string();
    Ok((response, route_label))
}
