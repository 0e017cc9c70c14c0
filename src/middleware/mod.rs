//! # HTTP Capture Middleware
//!
//! Axum middleware that records HTTP headers and bodies as span attributes
//! on documentation and debug traces. Both middleware read the classification
//! from the active OpenTelemetry context, so they must run inside the layer
//! that starts the server span (see
//! [`crate::observability::trace_http_requests`]).
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use axum::{middleware, routing::post, Router};
//! use multiplayer_otel::middleware::{capture_request, capture_response, MiddlewareOptions};
//! use multiplayer_otel::observability::trace_http_requests;
//!
//! let options = Arc::new(MiddlewareOptions::new().with_headers_to_mask(["x-api-key"]));
//! let app: Router = Router::new()
//!     .route("/orders", post(|| async { "{}" }))
//!     .layer(middleware::from_fn_with_state(options.clone(), capture_response))
//!     .layer(middleware::from_fn_with_state(options, capture_request))
//!     .layer(middleware::from_fn(trace_http_requests));
//! ```
//!
//! Capture never fails a request: invalid payloads, unsupported content types
//! and oversized bodies only mean that an attribute is left out.

mod body;
pub mod options;
pub mod request;
pub mod response;

pub use options::MiddlewareOptions;
pub use request::capture_request;
pub use response::capture_response;

use metrics::counter;
use opentelemetry::{trace::TraceContextExt, Context, KeyValue};
use tracing::debug;

use crate::constants::{ATTR_MULTIPLAYER_HTTP_REQUEST_BODY, ATTR_MULTIPLAYER_HTTP_RESPONSE_BODY};
use crate::payload::truncate_if_needed;
use crate::trace::TraceClassification;

#[derive(Debug, Clone, Copy)]
pub(crate) enum Direction {
    Request,
    Response,
}

impl Direction {
    fn attribute(self) -> &'static str {
        match self {
            Self::Request => ATTR_MULTIPLAYER_HTTP_REQUEST_BODY,
            Self::Response => ATTR_MULTIPLAYER_HTTP_RESPONSE_BODY,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Response => "response",
        }
    }
}

/// Transform, truncate and record a captured body on the span in `cx`.
///
/// Empty bodies and payloads the transformation rejects are skipped.
pub(crate) fn record_body(
    cx: &Context,
    options: &MiddlewareOptions,
    classification: TraceClassification,
    body: &[u8],
    direction: Direction,
) {
    if body.is_empty() {
        return;
    }

    let transform = options.transform_for(classification);
    let Some(transformed) = transform.apply(body) else {
        debug!(?transform, direction = direction.as_str(), "payload could not be transformed");
        return;
    };

    let text = String::from_utf8_lossy(&transformed);
    let value = truncate_if_needed(&text, options.max_payload_size()).into_owned();
    cx.span().set_attribute(KeyValue::new(direction.attribute(), value));

    counter!(
        "multiplayer_payload_captures_total",
        "direction" => direction.as_str(),
        "classification" => classification.as_str()
    )
    .increment(1);
}
