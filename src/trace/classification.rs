//! Trace classification derived from identifier prefixes.
//!
//! Classification is never stored anywhere: it is recomputed from the first
//! three bytes of the trace id every time it is needed, so the generator, the
//! sampler and the middleware always agree.

use opentelemetry::TraceId;

use crate::constants::{
    MULTIPLAYER_TRACE_DEBUG_PREFIX, MULTIPLAYER_TRACE_DEBUG_PREFIX_BYTES,
    MULTIPLAYER_TRACE_DOC_PREFIX, MULTIPLAYER_TRACE_DOC_PREFIX_BYTES,
};

/// Capture mode encoded in a trace id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceClassification {
    /// Ordinary traffic, nothing is captured.
    None,
    /// Sampled for API documentation; payload shapes are recorded.
    Doc,
    /// Part of a debug session; payloads are recorded masked.
    Debug,
}

impl TraceClassification {
    /// Classify a trace id by comparing its leading bytes with the prefixes.
    pub fn from_trace_id(trace_id: TraceId) -> Self {
        let bytes = trace_id.to_bytes();
        if bytes.starts_with(&MULTIPLAYER_TRACE_DEBUG_PREFIX_BYTES) {
            Self::Debug
        } else if bytes.starts_with(&MULTIPLAYER_TRACE_DOC_PREFIX_BYTES) {
            Self::Doc
        } else {
            Self::None
        }
    }

    /// Classify the canonical lower-case hex form of a trace id.
    pub fn from_hex(trace_id: &str) -> Self {
        if is_debug_trace(trace_id) {
            Self::Debug
        } else if is_doc_trace(trace_id) {
            Self::Doc
        } else {
            Self::None
        }
    }

    pub fn is_classified(self) -> bool {
        self != Self::None
    }

    pub fn is_debug(self) -> bool {
        self == Self::Debug
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Doc => "doc",
            Self::Debug => "debug",
        }
    }
}

impl std::fmt::Display for TraceClassification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn is_debug_trace(trace_id: &str) -> bool {
    trace_id.starts_with(MULTIPLAYER_TRACE_DEBUG_PREFIX)
}

pub fn is_doc_trace(trace_id: &str) -> bool {
    trace_id.starts_with(MULTIPLAYER_TRACE_DOC_PREFIX)
}

/// True for both documentation and debug traces.
pub fn is_multiplayer_trace(trace_id: &str) -> bool {
    is_debug_trace(trace_id) || is_doc_trace(trace_id)
}
