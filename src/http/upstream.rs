//! Upstream dispatch.
//!
//! # Responsibilities
//! - Build the upstream URI from the target URL and the inbound raw URI
//! - Assemble the outbound request (method, headers, body)
//! - Execute the round trip and buffer the full response body
//!
//! # Design Decisions
//! - No retries: a failed round trip fails only the current request
//! - The whole round trip, body read included, shares one deadline
//! - Response bodies are buffered (capped) so headers can be finalized first

use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{header, response, HeaderMap, HeaderValue, Method, Request, Uri};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use url::Url;

use crate::config::ProxyConfig;
use crate::error::{ProxyError, ProxyResult};

/// Where one request is sent.
#[derive(Debug, Clone)]
pub struct UpstreamTarget {
    /// Target URL followed by the inbound path and query, byte for byte.
    pub uri: String,
    /// The parsed target URL. Only its host and port are used.
    pub base: Url,
}

impl UpstreamTarget {
    /// Append the request's raw path and query to the configured target.
    ///
    /// Nothing is normalized: dot segments and query bytes reach the
    /// upstream exactly as the caller sent them.
    pub fn new(target_url: &str, request_uri: &Uri) -> ProxyResult<Self> {
        let base = Url::parse(target_url).map_err(|source| ProxyError::InvalidUrl {
            url: target_url.to_string(),
            source,
        })?;

        let path_and_query = request_uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let uri = format!("{}{}", target_url.trim_end_matches('/'), path_and_query);

        Ok(Self { uri, base })
    }

    /// `host[:port]` of the upstream, as reported in `Requested-Host`.
    pub fn requested_host(&self) -> String {
        let host = self.base.host_str().unwrap_or_default();
        match self.base.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        }
    }
}

/// Body of the outbound request.
#[derive(Debug)]
pub enum OutboundBody {
    /// Stream the caller's body through untouched.
    Inbound(Body),
    /// A fully buffered replacement body.
    Buffered(Bytes),
}

/// Build the request sent to the upstream.
///
/// Every inbound header is copied, keeping repeated values in order, except
/// `Host` (the client derives it from the URL). When the body was replaced,
/// framing headers are dropped and `Content-Length` is set to the new size.
pub fn build_request(
    method: Method,
    uri: &str,
    inbound_headers: &HeaderMap,
    body: OutboundBody,
) -> ProxyResult<Request<Body>> {
    let replaced = matches!(body, OutboundBody::Buffered(_));

    let mut req = Request::builder().method(method).uri(uri);

    if let Some(headers) = req.headers_mut() {
        for (name, value) in inbound_headers.iter() {
            if name == header::HOST {
                continue;
            }
            if replaced && (name == header::CONTENT_LENGTH || name == header::TRANSFER_ENCODING) {
                continue;
            }
            headers.append(name.clone(), value.clone());
        }
        if let OutboundBody::Buffered(bytes) = &body {
            headers.insert(header::CONTENT_LENGTH, HeaderValue::from(bytes.len()));
        }
    }

    let body = match body {
        OutboundBody::Inbound(body) => body,
        OutboundBody::Buffered(bytes) => Body::from(bytes),
    };

    Ok(req.body(body)?)
}

/// A fully read upstream response.
#[derive(Debug)]
pub struct UpstreamResponse {
    pub parts: response::Parts,
    pub body: Bytes,
}

/// Client for the single configured upstream.
#[derive(Clone)]
pub struct UpstreamClient {
    client: Client<HttpConnector, Body>,
    timeout: Duration,
    max_body_bytes: usize,
}

impl UpstreamClient {
    pub fn new(config: &ProxyConfig) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Self {
            client,
            timeout: Duration::from_secs(config.timeouts.upstream_secs),
            max_body_bytes: config.limits.max_response_body_bytes,
        }
    }

    /// Execute the round trip and read the whole response body.
    pub async fn send(&self, request: Request<Body>) -> ProxyResult<UpstreamResponse> {
        let round_trip = async {
            let response = self.client.request(request).await?;
            let (parts, body) = response.into_parts();

            let body = axum::body::to_bytes(Body::new(body), self.max_body_bytes)
                .await
                .map_err(|e| ProxyError::ResponseBody(e.to_string()))?;

            Ok::<_, ProxyError>(UpstreamResponse { parts, body })
        };

        tokio::time::timeout(self.timeout, round_trip)
            .await
            .map_err(|_| ProxyError::Timeout(self.timeout.as_secs()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(base: &str, uri: &str) -> UpstreamTarget {
        UpstreamTarget::new(base, &uri.parse().unwrap()).unwrap()
    }

    #[test]
    fn uri_joins_target_and_raw_request() {
        let query = "/testendpoint4/query?param1=foo&param2=10";

        let joined = target("http://localhost:14200", query);
        assert_eq!(
            joined.uri,
            "http://localhost:14200/testendpoint4/query?param1=foo&param2=10"
        );

        assert_eq!(target("http://localhost:14200/", query).uri, joined.uri);
        assert_eq!(
            target("http://localhost:14200/api", "/users").uri,
            "http://localhost:14200/api/users"
        );
    }

    #[test]
    fn raw_request_is_not_normalized() {
        assert_eq!(
            target("http://localhost:1", "/x/../testendpoint1").uri,
            "http://localhost:1/x/../testendpoint1"
        );
        assert_eq!(
            target("http://localhost:1", "/plain?name=O'Brien&x=a%20b").uri,
            "http://localhost:1/plain?name=O'Brien&x=a%20b"
        );
    }

    #[test]
    fn bad_target_is_invalid_url() {
        let err = UpstreamTarget::new("not a url", &"/x".parse().unwrap()).unwrap_err();
        assert!(matches!(err, ProxyError::InvalidUrl { .. }));
    }

    #[test]
    fn requested_host_includes_explicit_port() {
        let local = target("http://localhost:14200", "/a");
        assert_eq!(local.requested_host(), "localhost:14200");
        assert_eq!(target("http://example.com", "/a").requested_host(), "example.com");
    }

    #[test]
    fn headers_are_copied_except_host() {
        let mut inbound = HeaderMap::new();
        inbound.insert(header::HOST, HeaderValue::from_static("proxy.local"));
        inbound.append("x-multi", HeaderValue::from_static("one"));
        inbound.append("x-multi", HeaderValue::from_static("two"));
        inbound.insert(header::CONTENT_LENGTH, HeaderValue::from_static("3"));

        let body = OutboundBody::Inbound(Body::from("abc"));
        let req = build_request(Method::POST, "http://localhost:1/a", &inbound, body).unwrap();

        assert_eq!(req.method(), Method::POST);
        assert_eq!(req.uri(), "http://localhost:1/a");
        assert!(req.headers().get(header::HOST).is_none());
        let multi: Vec<_> = req.headers().get_all("x-multi").iter().collect();
        assert_eq!(multi, vec!["one", "two"]);
        assert_eq!(req.headers()[header::CONTENT_LENGTH], "3");
    }

    #[test]
    fn replaced_body_resets_framing_headers() {
        let mut inbound = HeaderMap::new();
        inbound.insert(header::CONTENT_LENGTH, HeaderValue::from_static("999"));
        inbound.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));

        let body = OutboundBody::Buffered(Bytes::from_static(b"{\"a\":1}"));
        let req = build_request(Method::PATCH, "http://localhost:1/a", &inbound, body).unwrap();

        assert_eq!(req.headers()[header::CONTENT_LENGTH], "7");
        assert!(req.headers().get(header::TRANSFER_ENCODING).is_none());
    }
}
