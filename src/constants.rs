//! # Wire Constants
//!
//! Identifier prefixes, span attribute keys and size limits shared by the
//! generator, the sampler and the HTTP capture middleware. These values are
//! part of the contract with the Multiplayer backend and must not change.

/// Hex prefix stamped on trace ids chosen for automatic API documentation.
pub const MULTIPLAYER_TRACE_DOC_PREFIX: &str = "d0cd0c";

/// Hex prefix stamped on trace ids generated during a debug session.
pub const MULTIPLAYER_TRACE_DEBUG_PREFIX: &str = "debdeb";

/// Raw bytes of [`MULTIPLAYER_TRACE_DOC_PREFIX`].
pub const MULTIPLAYER_TRACE_DOC_PREFIX_BYTES: [u8; 3] = [0xd0, 0xcd, 0x0c];

/// Raw bytes of [`MULTIPLAYER_TRACE_DEBUG_PREFIX`].
pub const MULTIPLAYER_TRACE_DEBUG_PREFIX_BYTES: [u8; 3] = [0xde, 0xbd, 0xeb];

/// Default OTLP/HTTP endpoint for trace export.
pub const MULTIPLAYER_OTEL_DEFAULT_TRACES_EXPORTER_URL: &str =
    "https://api.multiplayer.app/v1/traces";

/// Default OTLP/HTTP endpoint for log export.
pub const MULTIPLAYER_OTEL_DEFAULT_LOGS_EXPORTER_URL: &str = "https://api.multiplayer.app/v1/logs";

/// Prefix shared by every attribute this crate writes.
pub const MULTIPLAYER_ATTRIBUTE_PREFIX: &str = "multiplayer.";

pub const ATTR_MULTIPLAYER_DEBUG_SESSION: &str = "multiplayer.debug_session._id";
pub const ATTR_MULTIPLAYER_HTTP_REQUEST_BODY: &str = "multiplayer.http.request.body";
pub const ATTR_MULTIPLAYER_HTTP_RESPONSE_BODY: &str = "multiplayer.http.response.body";
pub const ATTR_MULTIPLAYER_HTTP_REQUEST_HEADERS: &str = "multiplayer.http.request.headers";
pub const ATTR_MULTIPLAYER_HTTP_RESPONSE_HEADERS: &str = "multiplayer.http.response.headers";
pub const ATTR_MULTIPLAYER_HTTP_RESPONSE_BODY_ENCODING: &str =
    "multiplayer.http.response.body.encoding";

/// Replacement for every masked value.
pub const MASK_PLACEHOLDER: &str = "***MASKED***";

/// Suffix appended to payloads cut at the configured size.
pub const TRUNCATION_MARKER: &str = "...[TRUNCATED]";

/// Depth past which masking collapses whole subtrees.
pub const MAX_MASK_DEPTH: usize = 8;

/// Hard cap for recorded request/response payloads, in bytes.
pub const MULTIPLAYER_MAX_HTTP_REQUEST_RESPONSE_SIZE: usize = 50_000;

/// Default cap for buffering a body in memory before capture is skipped.
pub const DEFAULT_MAX_BUFFER_SIZE: usize = 1024 * 1024;

/// Response header exposing the trace id on debug traces.
pub const TRACE_ID_HEADER: &str = "x-trace-id";

/// Header names masked regardless of configuration.
pub const DEFAULT_HEADERS_TO_MASK: [&str; 4] =
    ["set-cookie", "cookie", "authorization", "proxy-authorization"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_exporter_urls() {
        assert!(MULTIPLAYER_OTEL_DEFAULT_TRACES_EXPORTER_URL.ends_with("/v1/traces"));
        assert!(MULTIPLAYER_OTEL_DEFAULT_LOGS_EXPORTER_URL.ends_with("/v1/logs"));
        assert_eq!(
            MULTIPLAYER_OTEL_DEFAULT_TRACES_EXPORTER_URL.trim_end_matches("/traces"),
            MULTIPLAYER_OTEL_DEFAULT_LOGS_EXPORTER_URL.trim_end_matches("/logs")
        );
    }

    #[test]
    fn test_prefix_bytes_match_hex() {
        assert_eq!(
            hex::decode(MULTIPLAYER_TRACE_DOC_PREFIX).unwrap(),
            MULTIPLAYER_TRACE_DOC_PREFIX_BYTES
        );
        assert_eq!(
            hex::decode(MULTIPLAYER_TRACE_DEBUG_PREFIX).unwrap(),
            MULTIPLAYER_TRACE_DEBUG_PREFIX_BYTES
        );
    }

    #[test]
    fn test_prefixes_are_disjoint() {
        assert_ne!(MULTIPLAYER_TRACE_DOC_PREFIX_BYTES, MULTIPLAYER_TRACE_DEBUG_PREFIX_BYTES);
        assert!(!MULTIPLAYER_TRACE_DOC_PREFIX.starts_with(MULTIPLAYER_TRACE_DEBUG_PREFIX));
        assert!(!MULTIPLAYER_TRACE_DEBUG_PREFIX.starts_with(MULTIPLAYER_TRACE_DOC_PREFIX));
    }

    #[test]
    fn test_attribute_keys_share_prefix() {
        for key in [
            ATTR_MULTIPLAYER_DEBUG_SESSION,
            ATTR_MULTIPLAYER_HTTP_REQUEST_BODY,
            ATTR_MULTIPLAYER_HTTP_RESPONSE_BODY,
            ATTR_MULTIPLAYER_HTTP_REQUEST_HEADERS,
            ATTR_MULTIPLAYER_HTTP_RESPONSE_HEADERS,
            ATTR_MULTIPLAYER_HTTP_RESPONSE_BODY_ENCODING,
        ] {
            assert!(key.starts_with(MULTIPLAYER_ATTRIBUTE_PREFIX), "{key}");
        }
    }
}
