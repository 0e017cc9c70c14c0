//! Response capture middleware.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{self, Poll};

use axum::{
    body::{Body, HttpBody},
    extract::{Request, State},
    http::{header::CONTENT_ENCODING, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use bytes::{Bytes, BytesMut};
use http_body::{Frame, SizeHint};
use opentelemetry::{trace::TraceContextExt, Context, KeyValue};

use crate::constants::{
    ATTR_MULTIPLAYER_HTTP_RESPONSE_BODY_ENCODING, ATTR_MULTIPLAYER_HTTP_RESPONSE_HEADERS,
    TRACE_ID_HEADER,
};
use crate::middleware::{record_body, Direction, MiddlewareOptions};
use crate::payload::mask_headers;
use crate::trace::TraceClassification;
use tracing::debug;

/// Axum middleware recording response headers and body on classified traces.
///
/// Debug traces also get an `X-Trace-Id` response header. The response is
/// returned as soon as the handler produces its head; the body streams through
/// unchanged while a copy of up to `max_buffer_size` bytes is kept. Headers and
/// body are recorded once the body finishes or is dropped, so a streaming
/// response is never held back by the capture.
pub async fn capture_response(
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

    let trace_id_header = if classification.is_debug() {
        HeaderValue::from_str(&trace_id.to_string()).ok()
    } else {
        None
    };

    let mut capture = ResponseCapture::new(cx, Arc::clone(&options), classification);
    if let Some(value) = &trace_id_header {
        capture.headers.insert(TRACE_ID_HEADER, value.clone());
    }

    let mut response = next.run(request).await;
    if let Some(value) = trace_id_header {
        response.headers_mut().insert(TRACE_ID_HEADER, value);
    }

    capture.headers = response.headers().clone();
    capture.content_encoding = response
        .headers()
        .get(CONTENT_ENCODING)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    let (parts, body) = response.into_parts();
    let body = CaptureBody::new(body, options.max_buffer_size(), capture);
    Response::from_parts(parts, Body::new(body))
}

/// Post-processing for one response, run exactly once when dropped.
///
/// Created before the inner handler runs, so the attributes are written even
/// if the handler panics or the request future is cancelled; in that case only
/// the headers known so far are recorded.
struct ResponseCapture {
    cx: Context,
    options: Arc<MiddlewareOptions>,
    classification: TraceClassification,
    headers: HeaderMap,
    content_encoding: Option<String>,
    body: Option<Bytes>,
}

impl ResponseCapture {
    fn new(
        cx: Context,
        options: Arc<MiddlewareOptions>,
        classification: TraceClassification,
    ) -> Self {
        Self {
            cx,
            options,
            classification,
            headers: HeaderMap::new(),
            content_encoding: None,
            body: None,
        }
    }
}

impl Drop for ResponseCapture {
    fn drop(&mut self) {
        let span = self.cx.span();
        span.set_attribute(KeyValue::new(
            ATTR_MULTIPLAYER_HTTP_RESPONSE_HEADERS,
            mask_headers(&self.headers, self.options.headers_to_mask()),
        ));

        if let Some(encoding) = self.content_encoding.take() {
            span.set_attribute(KeyValue::new(ATTR_MULTIPLAYER_HTTP_RESPONSE_BODY_ENCODING, encoding));
        }

        if let Some(body) = self.body.take() {
            record_body(&self.cx, &self.options, self.classification, &body, Direction::Response);
        }
    }
}

/// Response body that forwards every frame and keeps a bounded copy of the data.
///
/// The copy is abandoned once it would exceed `limit` or the body fails. The
/// capture is finished when the stream ends, or on drop. A body dropped before
/// reaching its end only records the headers.
struct CaptureBody {
    inner: Body,
    buffer: Option<BytesMut>,
    limit: usize,
    capture: Option<ResponseCapture>,
}

impl CaptureBody {
    fn new(inner: Body, limit: usize, capture: ResponseCapture) -> Self {
        Self { inner, buffer: Some(BytesMut::new()), limit, capture: Some(capture) }
    }

    fn finish(&mut self, completed: bool) {
        let Some(mut capture) = self.capture.take() else {
            return;
        };
        if completed {
            capture.body = self.buffer.take().map(BytesMut::freeze);
        }
    }
}

impl HttpBody for CaptureBody {
    type Data = <Body as HttpBody>::Data;
    type Error = <Body as HttpBody>::Error;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let poll_result = Pin::new(&mut self.inner).poll_frame(cx);

        match &poll_result {
            Poll::Ready(Some(Ok(frame))) => {
                if let Some(data) = frame.data_ref() {
                    let limit = self.limit;
                    let overflow = match self.buffer.as_mut() {
                        Some(buffer) if buffer.len() + data.len() > limit => true,
                        Some(buffer) => {
                            buffer.extend_from_slice(data);
                            false
                        }
                        None => false,
                    };
                    if overflow {
                        debug!(limit, "response body exceeds buffer limit, skipping capture");
                        self.buffer = None;
                    }
                }
            }
            Poll::Ready(Some(Err(err))) => {
                debug!(error = %err, "response body failed, skipping capture");
                self.buffer = None;
                self.finish(false);
            }
            Poll::Ready(None) => self.finish(true),
            Poll::Pending => {}
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

impl Drop for CaptureBody {
    fn drop(&mut self) {
        // Servers stop polling once `is_end_stream` holds, so that also counts
        // as a completed body.
        let completed = self.inner.is_end_stream();
        self.finish(completed);
    }
}
