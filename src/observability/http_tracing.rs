//! # HTTP Request Tracing Middleware
//!
//! Axum middleware that starts an OpenTelemetry server span for each request
//! and runs the rest of the stack inside that span's context. An incoming W3C
//! `traceparent` header is continued, so a classified trace started upstream
//! stays classified here. The span stays open until the response body has
//! been sent or dropped.

use std::pin::Pin;
use std::task::{self, Poll};
use std::time::Instant;

use axum::{
    body::{Body, HttpBody},
    extract::{MatchedPath, Request},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use http_body::{Frame, SizeHint};
use metrics::{counter, histogram};
use opentelemetry::{
    global,
    propagation::{Extractor, TextMapPropagator},
    trace::{FutureExt, SpanKind, Status, TraceContextExt, Tracer},
    Context, KeyValue,
};
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_semantic_conventions::trace::{
    HTTP_REQUEST_METHOD, HTTP_RESPONSE_STATUS_CODE, HTTP_ROUTE, URL_PATH,
};

const TRACER_NAME: &str = "multiplayer-otel-http";

/// Axum middleware that creates an OpenTelemetry span for each HTTP request
///
/// This middleware:
/// - Continues the trace from an incoming `traceparent` header
/// - Names the span after the method and matched route
/// - Sets the span status to error on 5xx responses
/// - Ends the span once the response body finishes
/// - Records request count and time-to-head metrics
pub async fn trace_http_requests(request: Request, next: Next) -> Response {
    let tracer = global::tracer(TRACER_NAME);

    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| path.clone());
    let start = Instant::now();

    let parent_cx = extract_trace_context(request.headers());
    let span = tracer
        .span_builder(format!("{} {}", method, route))
        .with_kind(SpanKind::Server)
        .with_attributes([
            KeyValue::new(HTTP_REQUEST_METHOD, method.clone()),
            KeyValue::new(HTTP_ROUTE, route.clone()),
            KeyValue::new(URL_PATH, path),
        ])
        .start_with_context(&tracer, &parent_cx);

    let cx = parent_cx.with_span(span);
    tracing::debug!(
        method = %method,
        route = %route,
        trace_id = %cx.span().span_context().trace_id(),
        "HTTP server span started"
    );

    let response = next.run(request).with_context(cx.clone()).await;

    let status_code = response.status().as_u16();
    let elapsed = start.elapsed();

    let span = cx.span();
    span.set_attribute(KeyValue::new(HTTP_RESPONSE_STATUS_CODE, i64::from(status_code)));
    if response.status().is_server_error() {
        span.set_status(Status::error("Server error"));
    }

    let status_label = status_code.to_string();
    counter!(
        "http_requests_total",
        "method" => method.clone(),
        "route" => route.clone(),
        "status" => status_label
    )
    .increment(1);

    histogram!(
        "http_request_duration_seconds",
        "method" => method,
        "route" => route
    )
    .record(elapsed.as_secs_f64());

    let (parts, body) = response.into_parts();
    Response::from_parts(parts, Body::new(TracedBody { inner: body, cx: Some(cx) }))
}

/// Response body that ends the request span when it completes, fails or is dropped.
struct TracedBody {
    inner: Body,
    cx: Option<Context>,
}

impl TracedBody {
    fn end_span(&mut self) {
        if let Some(cx) = self.cx.take() {
            cx.span().end();
        }
    }
}

impl HttpBody for TracedBody {
    type Data = <Body as HttpBody>::Data;
    type Error = <Body as HttpBody>::Error;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let poll_result = Pin::new(&mut self.inner).poll_frame(cx);

        match &poll_result {
            Poll::Ready(None) => self.end_span(),
            Poll::Ready(Some(Err(err))) => {
                if let Some(span_cx) = &self.cx {
                    span_cx.span().set_status(Status::error(err.to_string()));
                }
                self.end_span();
            }
            _ => {}
        }

        poll_result
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl Drop for TracedBody {
    fn drop(&mut self) {
        // Inner bodies record their attributes on drop, before the span ends.
        drop(std::mem::take(&mut self.inner));
        self.end_span();
    }
}

struct HeaderExtractor<'a>(&'a HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|k| k.as_str()).collect()
    }
}

/// Extract W3C trace context from request headers
pub(crate) fn extract_trace_context(headers: &HeaderMap) -> Context {
    TraceContextPropagator::new().extract(&HeaderExtractor(headers))
}
