//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;

use transform_proxy::config::{ProxyConfig, TlsConfig};
use transform_proxy::{HttpServer, Listeners, Shutdown};

/// One request as seen by the mock upstream.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub uri: String,
    pub headers: HeaderMap,
    pub body: String,
}

/// A mock upstream that records what it receives.
///
/// - `/doesnt/exist` answers 404
/// - `/slow` sleeps for two seconds before answering
/// - everything else answers 200 with `text/plain; charset=utf-8`
pub struct MockUpstream {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl MockUpstream {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last(&self) -> Recorded {
        self.requests().pop().expect("upstream received no request")
    }
}

type Log = Arc<Mutex<Vec<Recorded>>>;

async fn record(State(log): State<Log>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();

    log.lock().unwrap().push(Recorded {
        method: parts.method.to_string(),
        uri: parts.uri.to_string(),
        headers: parts.headers.clone(),
        body: String::from_utf8_lossy(&body).into_owned(),
    });

    let status = match parts.uri.path() {
        "/doesnt/exist" => StatusCode::NOT_FOUND,
        "/slow" => {
            tokio::time::sleep(Duration::from_secs(2)).await;
            StatusCode::OK
        }
        _ => StatusCode::OK,
    };

    let content_type = [(header::CONTENT_TYPE, "text/plain; charset=utf-8")];
    (status, content_type, "upstream says hi").into_response()
}

pub async fn start_upstream() -> MockUpstream {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests: Log = Arc::default();

    let app = Router::new().fallback(record).with_state(requests.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockUpstream { addr, requests }
}

/// An address nothing listens on.
pub async fn dead_upstream() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// A running proxy and how to reach it.
pub struct RunningProxy {
    pub plain: SocketAddr,
    pub tls: Option<SocketAddr>,
    pub shutdown: Shutdown,
}

impl RunningProxy {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.plain, path)
    }

    pub fn tls_url(&self, path: &str) -> String {
        format!("https://{}{}", self.tls.expect("TLS listener not running"), path)
    }
}

impl Drop for RunningProxy {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Config with ephemeral ports, pointed at `target_url`.
pub fn proxy_config(target_url: &str) -> ProxyConfig {
    ProxyConfig {
        target_url: target_url.to_string(),
        listening_port: "0".into(),
        ..ProxyConfig::default()
    }
}

pub async fn start_proxy(config: ProxyConfig) -> RunningProxy {
    let listeners = Listeners::bind(&config).await.unwrap();
    let plain = listeners.plain_addr().unwrap();
    let tls = listeners.tls_addr();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config);
    let server_shutdown = shutdown.clone();
    tokio::spawn(async move {
        let _ = server.run(listeners, &server_shutdown).await;
    });

    RunningProxy { plain, tls, shutdown }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// Write a self-signed certificate for localhost into `dir`.
pub fn write_self_signed(dir: &Path) -> (PathBuf, PathBuf) {
    let rcgen::CertifiedKey { cert, key_pair } =
        rcgen::generate_simple_self_signed(vec!["localhost".to_string(), "127.0.0.1".to_string()])
            .unwrap();

    let cert_path = dir.join("cert.pem");
    let key_path = dir.join("key.pem");
    std::fs::write(&cert_path, cert.pem()).unwrap();
    std::fs::write(&key_path, key_pair.serialize_pem()).unwrap();
    (cert_path, key_path)
}

pub fn tls_config(cert: &Path, key: &Path) -> TlsConfig {
    TlsConfig {
        enabled: true,
        cert_file: cert.display().to_string(),
        key_file: key.display().to_string(),
        listening_port: "0".into(),
    }
}
