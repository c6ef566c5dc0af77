//! Downstream response assembly.
//!
//! # Responsibilities
//! - Mirror the upstream status code and body bytes
//! - Copy upstream headers verbatim (repeated values kept)
//! - Apply the ordered header mutations once, last
//!
//! # Design Decisions
//! - `Transfer-Encoding` is not relayed: the body is re-sent fully buffered
//!   and hyper frames it itself

use axum::body::Body;
use axum::http::{header, Response};

use crate::http::upstream::UpstreamResponse;
use crate::transform::headers::{self, HeaderMutation};

/// Turn a buffered upstream response into the response for the caller.
pub fn into_downstream(upstream: UpstreamResponse, mutations: &[HeaderMutation]) -> Response<Body> {
    let UpstreamResponse { parts, body } = upstream;

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = parts.status;

    let headers = response.headers_mut();
    for (name, value) in parts.headers.iter() {
        if name == header::TRANSFER_ENCODING {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }

    headers::apply(headers, mutations);
    response
}
