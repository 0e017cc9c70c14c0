//! Depth-bounded JSON masking.
//!
//! Every leaf is replaced, not just fields with sensitive-looking names, so no
//! real value of a debug payload ever reaches the tracing backend.

use serde_json::Value;
use tracing::debug;

use crate::constants::MASK_PLACEHOLDER;

/// Mask every scalar in a JSON document.
///
/// Invalid JSON masks to the bare placeholder. Values nested deeper than
/// `max_depth` (the root is depth 0) collapse to the placeholder whole.
pub fn mask_json(input: &[u8], max_depth: usize) -> Vec<u8> {
    let value: Value = match serde_json::from_slice(input) {
        Ok(value) => value,
        Err(err) => {
            debug!(error = %err, "payload is not valid JSON, masking it entirely");
            return MASK_PLACEHOLDER.as_bytes().to_vec();
        }
    };

    let masked = mask_value(value, 0, max_depth);
    serde_json::to_vec(&masked).unwrap_or_else(|_| MASK_PLACEHOLDER.as_bytes().to_vec())
}

/// Recursively mask a parsed value in place of its scalars.
pub fn mask_value(value: Value, depth: usize, max_depth: usize) -> Value {
    if depth > max_depth {
        return placeholder();
    }

    match value {
        Value::Object(map) => Value::Object(
            map.into_iter().map(|(key, value)| (key, mask_value(value, depth + 1, max_depth))).collect(),
        ),
        Value::Array(items) => Value::Array(
            items.into_iter().map(|item| mask_value(item, depth + 1, max_depth)).collect(),
        ),
        Value::String(_) | Value::Number(_) | Value::Bool(_) | Value::Null => placeholder(),
    }
}

fn placeholder() -> Value {
    Value::String(MASK_PLACEHOLDER.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MAX_MASK_DEPTH;
    use proptest::prelude::*;
    use serde_json::json;

    fn mask(value: &Value, max_depth: usize) -> Value {
        serde_json::from_slice(&mask_json(value.to_string().as_bytes(), max_depth)).unwrap()
    }

    #[test]
    fn test_mask_nested_document() {
        let input = json!({"a": 1, "b": [1, 2, {"c": "x"}]});
        assert_eq!(
            mask(&input, MAX_MASK_DEPTH),
            json!({
                "a": "***MASKED***",
                "b": ["***MASKED***", "***MASKED***", {"c": "***MASKED***"}]
            })
        );
    }

    #[test]
    fn test_mask_scalars() {
        for input in [json!("secret"), json!(42), json!(true), json!(null)] {
            assert_eq!(mask(&input, MAX_MASK_DEPTH), json!("***MASKED***"));
        }
    }

    #[test]
    fn test_mask_keeps_empty_containers() {
        assert_eq!(mask(&json!({}), MAX_MASK_DEPTH), json!({}));
        assert_eq!(mask(&json!([]), MAX_MASK_DEPTH), json!([]));
    }

    #[test]
    fn test_containers_past_depth_collapse() {
        let input = json!({"a": {"b": {"c": 1}}, "d": [[1]]});
        assert_eq!(mask(&input, 1), json!({"a": {"b": "***MASKED***"}, "d": ["***MASKED***"]}));
        assert_eq!(mask(&input, 0), json!({"a": "***MASKED***", "d": "***MASKED***"}));
    }

    #[test]
    fn test_invalid_json_masks_to_placeholder() {
        assert_eq!(mask_json(b"{not json", MAX_MASK_DEPTH), b"***MASKED***".to_vec());
        assert_eq!(mask_json(b"", MAX_MASK_DEPTH), b"***MASKED***".to_vec());
    }

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| json!(n)),
            "[a-z]{0,8}".prop_map(Value::String),
        ];
        leaf.prop_recursive(12, 64, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                prop::collection::btree_map("[a-z]{1,4}", inner, 0..6)
                    .prop_map(|map| Value::Object(map.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn test_mask_is_idempotent(value in arb_json()) {
            let once = mask_json(value.to_string().as_bytes(), MAX_MASK_DEPTH);
            let twice = mask_json(&once, MAX_MASK_DEPTH);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn test_masked_output_has_no_original_scalars(value in arb_json()) {
            let masked: Value = serde_json::from_slice(&mask_json(value.to_string().as_bytes(), 32)).unwrap();
            fn only_placeholders(value: &Value) -> bool {
                match value {
                    Value::Object(map) => map.values().all(only_placeholders),
                    Value::Array(items) => items.iter().all(only_placeholders),
                    Value::String(s) => s == MASK_PLACEHOLDER,
                    _ => false,
                }
            }
            prop_assert!(only_placeholders(&masked));
        }
    }
}
