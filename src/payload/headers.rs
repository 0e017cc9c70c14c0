//! Header serialization with masking of credential-bearing headers.

use std::collections::HashSet;

use http::HeaderMap;
use serde_json::{Map, Value};
use tracing::warn;

use crate::constants::{DEFAULT_HEADERS_TO_MASK, MASK_PLACEHOLDER};

/// Serialize headers to a JSON object, masking sensitive ones.
///
/// `headers_to_mask` must hold lower-case names; it is consulted in addition
/// to [`DEFAULT_HEADERS_TO_MASK`]. Masked headers map to the placeholder,
/// everything else to the array of its values.
///
/// Keys are the lower-case names stored by [`HeaderMap`] (`cookie`, not
/// `Cookie`). HTTP/2 only carries lower-case names, so the attribute looks the
/// same whichever protocol version the request arrived on.
pub fn mask_headers(headers: &HeaderMap, headers_to_mask: &HashSet<String>) -> String {
    let mut normalized = Map::new();

    for name in headers.keys() {
        let key = name.as_str();
        let value = if DEFAULT_HEADERS_TO_MASK.contains(&key) || headers_to_mask.contains(key) {
            Value::String(MASK_PLACEHOLDER.to_string())
        } else {
            Value::Array(
                headers
                    .get_all(name)
                    .iter()
                    .map(|value| Value::String(String::from_utf8_lossy(value.as_bytes()).into_owned()))
                    .collect(),
            )
        };
        normalized.insert(key.to_string(), value);
    }

    serde_json::to_string(&normalized).unwrap_or_else(|err| {
        warn!(error = %err, "could not serialize headers");
        String::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use serde_json::json;

    fn parse(serialized: &str) -> Value {
        serde_json::from_str(serialized).unwrap()
    }

    #[test]
    fn test_default_headers_are_masked() {
        let mut headers = HeaderMap::new();
        headers.insert("Cookie", HeaderValue::from_static("session=abc"));
        headers.insert("X-Custom", HeaderValue::from_static("keep"));

        let masked = parse(&mask_headers(&headers, &HashSet::new()));
        assert_eq!(masked, json!({"cookie": "***MASKED***", "x-custom": ["keep"]}));
    }

    #[test]
    fn test_all_defaults() {
        let mut headers = HeaderMap::new();
        for name in DEFAULT_HEADERS_TO_MASK {
            headers.insert(name, HeaderValue::from_static("secret"));
        }
        let masked = mask_headers(&headers, &HashSet::new());
        assert!(!masked.contains("secret"));
    }

    #[test]
    fn test_custom_headers_are_masked() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Api-Key", HeaderValue::from_static("k"));
        headers.insert("Accept", HeaderValue::from_static("*/*"));
        let custom = HashSet::from(["x-api-key".to_string()]);

        let masked = parse(&mask_headers(&headers, &custom));
        assert_eq!(masked, json!({"x-api-key": "***MASKED***", "accept": ["*/*"]}));
    }

    #[test]
    fn test_repeated_headers_keep_all_values() {
        let mut headers = HeaderMap::new();
        headers.append("Accept", HeaderValue::from_static("text/html"));
        headers.append("Accept", HeaderValue::from_static("application/json"));
        headers.append("Set-Cookie", HeaderValue::from_static("a=1"));
        headers.append("Set-Cookie", HeaderValue::from_static("b=2"));

        let masked = parse(&mask_headers(&headers, &HashSet::new()));
        assert_eq!(
            masked,
            json!({"accept": ["text/html", "application/json"], "set-cookie": "***MASKED***"})
        );
    }

    #[test]
    fn test_keys_are_lower_case() {
        let mut headers = HeaderMap::new();
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        headers.insert("PROXY-AUTHORIZATION", HeaderValue::from_static("Basic abc"));

        let masked = parse(&mask_headers(&headers, &HashSet::new()));
        assert_eq!(
            masked,
            json!({"content-type": ["application/json"], "proxy-authorization": "***MASKED***"})
        );
    }

    #[test]
    fn test_empty_headers() {
        assert_eq!(mask_headers(&HeaderMap::new(), &HashSet::new()), "{}");
    }
}
