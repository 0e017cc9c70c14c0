//! Capture middleware configuration.

use std::collections::HashSet;

use crate::constants::{DEFAULT_MAX_BUFFER_SIZE, MULTIPLAYER_MAX_HTTP_REQUEST_RESPONSE_SIZE};
use crate::payload::PayloadTransform;
use crate::trace::{RatioDependentIdGenerator, TraceClassification};

/// Options shared by the request and response capture middleware.
///
/// Built once at startup and shared read-only between requests.
#[derive(Debug, Clone)]
pub struct MiddlewareOptions {
    headers_to_mask: HashSet<String>,
    max_payload_size: usize,
    max_buffer_size: usize,
    schemify_doc_span_payload: bool,
    mask_debug_span_payload: bool,
    debug_session_source: Option<RatioDependentIdGenerator>,
}

impl Default for MiddlewareOptions {
    fn default() -> Self {
        Self {
            headers_to_mask: HashSet::new(),
            max_payload_size: MULTIPLAYER_MAX_HTTP_REQUEST_RESPONSE_SIZE,
            max_buffer_size: DEFAULT_MAX_BUFFER_SIZE,
            schemify_doc_span_payload: true,
            mask_debug_span_payload: true,
            debug_session_source: None,
        }
    }
}

impl MiddlewareOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Additional header names to mask; matched case-insensitively and on top
    /// of the built-in credential headers.
    pub fn with_headers_to_mask<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.headers_to_mask =
            headers.into_iter().map(|name| name.as_ref().trim().to_ascii_lowercase()).collect();
        self
    }

    /// Maximum size of a recorded payload. Values at or above the hard cap
    /// are ignored.
    pub fn with_max_payload_size(mut self, max_payload_size: usize) -> Self {
        if max_payload_size < MULTIPLAYER_MAX_HTTP_REQUEST_RESPONSE_SIZE {
            self.max_payload_size = max_payload_size;
        }
        self
    }

    /// Maximum body size buffered in memory; larger bodies pass through
    /// without being captured.
    pub fn with_max_buffer_size(mut self, max_buffer_size: usize) -> Self {
        self.max_buffer_size = max_buffer_size;
        self
    }

    pub fn with_schemify_doc_span_payload(mut self, enabled: bool) -> Self {
        self.schemify_doc_span_payload = enabled;
        self
    }

    pub fn with_mask_debug_span_payload(mut self, enabled: bool) -> Self {
        self.mask_debug_span_payload = enabled;
        self
    }

    /// Record the active debug session id on debug traces.
    pub fn with_debug_session_source(mut self, generator: RatioDependentIdGenerator) -> Self {
        self.debug_session_source = Some(generator);
        self
    }

    pub fn headers_to_mask(&self) -> &HashSet<String> {
        &self.headers_to_mask
    }

    pub fn max_payload_size(&self) -> usize {
        self.max_payload_size
    }

    pub fn max_buffer_size(&self) -> usize {
        self.max_buffer_size
    }

    pub fn schemify_doc_span_payload(&self) -> bool {
        self.schemify_doc_span_payload
    }

    pub fn mask_debug_span_payload(&self) -> bool {
        self.mask_debug_span_payload
    }

    pub(crate) fn debug_session(&self) -> Option<String> {
        self.debug_session_source.as_ref().and_then(RatioDependentIdGenerator::debug_session)
    }

    pub(crate) fn transform_for(&self, classification: TraceClassification) -> PayloadTransform {
        PayloadTransform::select(
            classification,
            self.mask_debug_span_payload,
            self.schemify_doc_span_payload,
        )
    }
}
