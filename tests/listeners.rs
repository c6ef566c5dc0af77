//! Plain and TLS listener bootstrap.

mod common;

use axum::http::StatusCode;
use common::{client, proxy_config, start_proxy, start_upstream, tls_config, write_self_signed};
use transform_proxy::config::RoutingEntry;
use transform_proxy::net::ListenerError;
use transform_proxy::Listeners;

fn tls_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .danger_accept_invalid_certs(true)
        .build()
        .unwrap()
}

#[tokio::test]
async fn plain_and_tls_listeners_share_the_pipeline() {
    let upstream = start_upstream().await;
    let dir = tempfile::tempdir().unwrap();
    let (cert, key) = write_self_signed(dir.path());

    let mut config = proxy_config(&upstream.url());
    config.tls = Some(tls_config(&cert, &key));
    config.routes = vec![RoutingEntry {
        path: "/testendpoint1".into(),
        from_method: "GET".into(),
        to_method: "POST".into(),
        ..RoutingEntry::default()
    }];
    let proxy = start_proxy(config).await;
    assert!(proxy.tls.is_some());
    assert_ne!(proxy.tls, Some(proxy.plain));

    let plain = client().get(proxy.url("/testendpoint1")).send().await.unwrap();
    assert_eq!(plain.status(), StatusCode::OK);
    assert_eq!(upstream.last().method, "POST");

    let secure = tls_client().get(proxy.tls_url("/testendpoint1")).send().await.unwrap();
    assert_eq!(secure.status(), StatusCode::OK);
    assert_eq!(secure.text().await.unwrap(), "upstream says hi");
    assert_eq!(upstream.last().method, "POST");
    assert_eq!(upstream.requests().len(), 2);
}

#[tokio::test]
async fn disabled_tls_starts_plain_only() {
    let upstream = start_upstream().await;
    let dir = tempfile::tempdir().unwrap();
    let (cert, key) = write_self_signed(dir.path());

    let mut config = proxy_config(&upstream.url());
    let mut tls = tls_config(&cert, &key);
    tls.enabled = false;
    config.tls = Some(tls);

    let proxy = start_proxy(config).await;
    assert!(proxy.tls.is_none());

    let response = client().get(proxy.url("/")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn invalid_certificate_is_fatal_at_startup() {
    let dir = tempfile::tempdir().unwrap();
    let cert = dir.path().join("cert.pem");
    let key = dir.path().join("key.pem");
    std::fs::write(&cert, "not a certificate").unwrap();
    std::fs::write(&key, "not a key").unwrap();

    let mut config = proxy_config("http://127.0.0.1:1");
    config.tls = Some(tls_config(&cert, &key));

    assert!(matches!(
        Listeners::bind(&config).await,
        Err(ListenerError::Tls(_))
    ));
}

#[tokio::test]
async fn shutdown_stops_both_listeners() {
    let upstream = start_upstream().await;
    let dir = tempfile::tempdir().unwrap();
    let (cert, key) = write_self_signed(dir.path());

    let mut config = proxy_config(&upstream.url());
    config.tls = Some(tls_config(&cert, &key));
    let proxy = start_proxy(config).await;
    let plain = proxy.plain;
    let tls = proxy.tls.unwrap();

    // Serving means both listeners are subscribed.
    let response = client().get(proxy.url("/")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    proxy.shutdown.trigger();
    tokio::time::sleep(std::time::Duration::from_millis(300)).await;

    assert!(tokio::net::TcpStream::connect(plain).await.is_err());
    assert!(tokio::net::TcpStream::connect(tls).await.is_err());
}
