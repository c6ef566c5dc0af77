//! Listener bootstrap: one plaintext listener and an optional TLS listener.
//!
//! # Responsibilities
//! - Bind the configured plaintext port
//! - Load TLS material and bind the encrypted port when TLS is enabled
//! - Serve a router on each until shutdown is triggered
//!
//! # Design Decisions
//! - Binding happens up front and any failure is fatal (no partial mode)
//! - Each listener is served by its own task; one failing or draining
//!   slowly does not hold up the other

use std::io;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::config::{ProxyConfig, TlsConfig};
use crate::lifecycle::shutdown;
use crate::net::tls::load_tls_config;

/// How long the TLS listener waits for in-flight connections on shutdown.
const TLS_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Failed to bind to address.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// Certificate or key could not be loaded.
    #[error("failed to load TLS material: {0}")]
    Tls(#[source] io::Error),

    /// The server loop returned an error.
    #[error("{listener} listener failed: {source}")]
    Serve {
        listener: &'static str,
        #[source]
        source: io::Error,
    },

    /// The listener task panicked or was cancelled.
    #[error("{listener} listener task aborted: {reason}")]
    Task {
        listener: &'static str,
        reason: String,
    },
}

/// An encrypted listener ready to serve.
pub struct TlsListener {
    inner: std::net::TcpListener,
    config: RustlsConfig,
}

impl TlsListener {
    async fn bind(host: &str, tls: &TlsConfig) -> Result<Self, ListenerError> {
        let config = load_tls_config(Path::new(&tls.cert_file), Path::new(&tls.key_file))
            .await
            .map_err(ListenerError::Tls)?;

        let addr = format!("{}:{}", host, tls.listening_port);
        let inner = std::net::TcpListener::bind(&addr)
            .and_then(|listener| {
                listener.set_nonblocking(true)?;
                Ok(listener)
            })
            .map_err(|source| ListenerError::Bind { addr, source })?;

        Ok(Self { inner, config })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner.local_addr()
    }
}

/// All listeners bound for one configuration.
pub struct Listeners {
    pub plain: TcpListener,
    pub tls: Option<TlsListener>,
}

impl Listeners {
    /// Bind the plaintext listener and, if enabled, the TLS listener.
    pub async fn bind(config: &ProxyConfig) -> Result<Self, ListenerError> {
        let addr = format!("{}:{}", config.listening_host, config.listening_port);
        let plain = TcpListener::bind(&addr)
            .await
            .map_err(|source| ListenerError::Bind { addr, source })?;

        let tls = match config.active_tls() {
            Some(tls) => Some(TlsListener::bind(&config.listening_host, tls).await?),
            None => None,
        };

        if let Ok(addr) = plain.local_addr() {
            tracing::info!(address = %addr, "Plain listener bound");
        }
        if let Some(Ok(addr)) = tls.as_ref().map(TlsListener::local_addr) {
            tracing::info!(address = %addr, "TLS listener bound");
        }

        Ok(Self { plain, tls })
    }

    pub fn plain_addr(&self) -> io::Result<SocketAddr> {
        self.plain.local_addr()
    }

    pub fn tls_addr(&self) -> Option<SocketAddr> {
        self.tls.as_ref().and_then(|tls| tls.local_addr().ok())
    }
}

/// Serve `router` over plain HTTP until shutdown.
pub async fn serve_plain(
    listener: TcpListener,
    router: Router,
    shutdown: broadcast::Receiver<()>,
) -> Result<(), ListenerError> {
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown::wait(shutdown))
        .await
        .map_err(|source| ListenerError::Serve {
            listener: "plain",
            source,
        })?;

    tracing::info!("Plain listener stopped");
    Ok(())
}

/// Serve `router` over TLS until shutdown.
pub async fn serve_tls(
    listener: TlsListener,
    router: Router,
    shutdown: broadcast::Receiver<()>,
) -> Result<(), ListenerError> {
    let handle = axum_server::Handle::new();

    let drain = handle.clone();
    tokio::spawn(async move {
        shutdown::wait(shutdown).await;
        drain.graceful_shutdown(Some(TLS_DRAIN_TIMEOUT));
    });

    axum_server::from_tcp_rustls(listener.inner, listener.config)
        .handle(handle)
        .serve(router.into_make_service())
        .await
        .map_err(|source| ListenerError::Serve {
            listener: "tls",
            source,
        })?;

    tracing::info!("TLS listener stopped");
    Ok(())
}
