//! Request capture middleware.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::CONTENT_TYPE,
    middleware::Next,
    response::Response,
};
use opentelemetry::{
    trace::{TraceContextExt, TraceId},
    Context, KeyValue,
};
use tracing::debug;

use crate::constants::{ATTR_MULTIPLAYER_DEBUG_SESSION, ATTR_MULTIPLAYER_HTTP_REQUEST_HEADERS};
use crate::middleware::{body::tee_body, record_body, Direction, MiddlewareOptions};
use crate::observability::http_tracing::extract_trace_context;
use crate::payload::mask_headers;
use crate::trace::TraceClassification;

/// Axum middleware recording request headers and body on classified traces.
///
/// Install with `axum::middleware::from_fn_with_state(options, capture_request)`
/// inside the layer that starts the server span. Requests on unclassified
/// traces are forwarded untouched.
///
/// The debug session id is read when the request arrives, and only recorded on
/// traces started by this process. A trace continued from an incoming
/// `traceparent` belongs to whichever session the upstream service started it
/// in, so it does not pick up the local one.
pub async fn capture_request(
    State(options): State<Arc<MiddlewareOptions>>,
    request: Request,
    next: Next,
) -> Response {
    let cx = Context::current();
    let trace_id = cx.span().span_context().trace_id();
    let classification = TraceClassification::from_trace_id(trace_id);
    if !classification.is_classified() {
        return next.run(request).await;
    }

    cx.span().set_attribute(KeyValue::new(
        ATTR_MULTIPLAYER_HTTP_REQUEST_HEADERS,
        mask_headers(request.headers(), options.headers_to_mask()),
    ));

    if classification.is_debug() && !continues_upstream_trace(&request, trace_id) {
        if let Some(session) = options.debug_session() {
            cx.span().set_attribute(KeyValue::new(ATTR_MULTIPLAYER_DEBUG_SESSION, session));
        }
    }

    if !is_json(&request) {
        debug!(%classification, "request is not JSON, skipping body capture");
        return next.run(request).await;
    }

    let (parts, body) = request.into_parts();
    let (body, captured) = tee_body(body, options.max_buffer_size()).await;
    let request = Request::from_parts(parts, body);

    if let Some(captured) = captured {
        record_body(&cx, &options, classification, &captured, Direction::Request);
    }

    next.run(request).await
}

/// Whether `trace_id` was taken from the request's own `traceparent` header.
fn continues_upstream_trace(request: &Request, trace_id: TraceId) -> bool {
    let upstream = extract_trace_context(request.headers());
    let upstream = upstream.span().span_context().clone();
    upstream.is_valid() && upstream.trace_id() == trace_id
}

fn is_json(request: &Request) -> bool {
    request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<mime::Mime>().ok())
        .is_some_and(|media_type| media_type.essence_str() == mime::APPLICATION_JSON.essence_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_with_content_type(content_type: &str) -> Request {
        Request::builder()
            .uri("/")
            .header(CONTENT_TYPE, content_type)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_is_json() {
        assert!(is_json(&request_with_content_type("application/json")));
        assert!(is_json(&request_with_content_type("application/json; charset=utf-8")));
        assert!(!is_json(&request_with_content_type("text/plain")));
        assert!(!is_json(&request_with_content_type("application/x-www-form-urlencoded")));
        assert!(!is_json(&Request::builder().uri("/").body(Body::empty()).unwrap()));
    }

    #[test]
    fn test_continues_upstream_trace() {
        let trace_id = TraceId::from_hex("debdeb0123456789abcdef0123456789").unwrap();
        let request = Request::builder()
            .uri("/")
            .header("traceparent", "00-debdeb0123456789abcdef0123456789-0123456789abcdef-01")
            .body(Body::empty())
            .unwrap();
        assert!(continues_upstream_trace(&request, trace_id));

        let local = TraceId::from_hex("debdeb00000000000000000000000001").unwrap();
        assert!(!continues_upstream_trace(&request, local));

        let bare = Request::builder().uri("/").body(Body::empty()).unwrap();
        assert!(!continues_upstream_trace(&bare, trace_id));
    }
}
