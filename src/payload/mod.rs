//! # Payload Transformation
//!
//! Turns captured HTTP payloads into span attribute values: masking for debug
//! traces, schema inference for documentation traces, and truncation for both.

pub mod headers;
pub mod mask;
pub mod schema;

use std::borrow::Cow;

pub use headers::mask_headers;
pub use mask::mask_json;
pub use schema::{generate_json_schema, JsonSchema, SchemaType};

use crate::constants::{MAX_MASK_DEPTH, TRUNCATION_MARKER};
use crate::trace::TraceClassification;

/// Transformation applied to a captured body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadTransform {
    /// Replace every value with the mask placeholder.
    Mask,
    /// Replace the payload with its inferred schema.
    Schemify,
    /// Record the payload as is.
    Raw,
}

impl PayloadTransform {
    /// Pick the transformation for a classified trace.
    ///
    /// Masking wins over schema inference on debug traces when both are on.
    pub fn select(
        classification: TraceClassification,
        mask_debug_payload: bool,
        schemify_doc_payload: bool,
    ) -> Self {
        if classification.is_debug() && mask_debug_payload {
            Self::Mask
        } else if schemify_doc_payload {
            Self::Schemify
        } else {
            Self::Raw
        }
    }

    /// Apply the transformation; `None` means nothing should be recorded.
    pub fn apply(self, body: &[u8]) -> Option<Cow<'_, [u8]>> {
        match self {
            Self::Mask => Some(Cow::Owned(mask_json(body, MAX_MASK_DEPTH))),
            Self::Schemify => generate_json_schema(body).map(Cow::Owned),
            Self::Raw => Some(Cow::Borrowed(body)),
        }
    }
}

/// Cut `data` to at most `max_payload_size` bytes and append the truncation
/// marker. The cut backs off to the previous UTF-8 character boundary.
pub fn truncate_if_needed(data: &str, max_payload_size: usize) -> Cow<'_, str> {
    if data.len() <= max_payload_size {
        return Cow::Borrowed(data);
    }

    let mut end = max_payload_size;
    while !data.is_char_boundary(end) {
        end -= 1;
    }
    Cow::Owned(format!("{}{}", &data[..end], TRUNCATION_MARKER))
}
