//! Schema inference for documentation payloads
//!
//! This module reduces a JSON payload to its structure. Only the shape is
//! kept; no value from the payload survives into the inferred schema.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// JSON type tag of an inferred schema node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    String,
    Number,
    Boolean,
    Null,
    Object,
    Array,
}

/// Inferred schema for a JSON value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonSchema {
    /// Type of the value
    #[serde(rename = "type")]
    pub schema_type: SchemaType,

    /// Items schema (if type is array), sampled from the first element
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<JsonSchema>>,

    /// Properties schemas (if type is object)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, JsonSchema>>,
}

impl JsonSchema {
    /// Create a new schema node for a given type
    pub fn new(schema_type: SchemaType) -> Self {
        Self { schema_type, items: None, properties: None }
    }

    /// Infer schema from a JSON value
    ///
    /// Arrays are assumed homogeneous: only the first element is inspected.
    pub fn infer(value: &Value) -> Self {
        match value {
            Value::Null => Self::new(SchemaType::Null),
            Value::Bool(_) => Self::new(SchemaType::Boolean),
            Value::Number(_) => Self::new(SchemaType::Number),
            Value::String(_) => Self::new(SchemaType::String),
            Value::Array(items) => {
                let mut schema = Self::new(SchemaType::Array);
                schema.items = items.first().map(|first| Box::new(Self::infer(first)));
                schema
            }
            Value::Object(map) => {
                let mut schema = Self::new(SchemaType::Object);
                schema.properties = Some(
                    map.iter().map(|(key, value)| (key.clone(), Self::infer(value))).collect(),
                );
                schema
            }
        }
    }
}

/// Infer the schema of a serialized JSON payload and serialize it back.
///
/// Returns `None` if the payload is not valid JSON.
pub fn generate_json_schema(input: &[u8]) -> Option<Vec<u8>> {
    let value: Value = match serde_json::from_slice(input) {
        Ok(value) => value,
        Err(err) => {
            debug!(error = %err, "payload is not valid JSON, skipping schema inference");
            return None;
        }
    };

    // `value` is dropped once the shape has been extracted
    let schema = JsonSchema::infer(&value);
    serde_json::to_vec(&schema).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema_of(value: Value) -> Value {
        serde_json::from_slice(&generate_json_schema(value.to_string().as_bytes()).unwrap())
            .unwrap()
    }

    #[test]
    fn test_infer_scalars() {
        assert_eq!(schema_of(json!("x")), json!({"type": "string"}));
        assert_eq!(schema_of(json!(1.5)), json!({"type": "number"}));
        assert_eq!(schema_of(json!(30)), json!({"type": "number"}));
        assert_eq!(schema_of(json!(false)), json!({"type": "boolean"}));
        assert_eq!(schema_of(json!(null)), json!({"type": "null"}));
    }

    #[test]
    fn test_infer_object() {
        let schema = schema_of(json!({"name": "x", "age": 30, "tags": ["a", "b"]}));
        assert_eq!(
            schema,
            json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string"},
                    "age": {"type": "number"},
                    "tags": {"type": "array", "items": {"type": "string"}}
                }
            })
        );
    }

    #[test]
    fn test_infer_empty_array_has_no_items() {
        let schema = schema_of(json!([]));
        assert_eq!(schema, json!({"type": "array"}));
        assert!(schema.get("items").is_none());
    }

    #[test]
    fn test_infer_array_samples_first_element() {
        let schema = schema_of(json!([{"id": 1}, "mixed", 3]));
        assert_eq!(
            schema,
            json!({
                "type": "array",
                "items": {"type": "object", "properties": {"id": {"type": "number"}}}
            })
        );
    }

    #[test]
    fn test_infer_empty_object_keeps_properties() {
        assert_eq!(schema_of(json!({})), json!({"type": "object", "properties": {}}));
    }

    #[test]
    fn test_schema_contains_no_values() {
        let bytes =
            generate_json_schema(br#"{"password":"hunter2","pin":1234,"nested":[{"token":"abc"}]}"#)
                .unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(!text.contains("hunter2"));
        assert!(!text.contains("1234"));
        assert!(!text.contains("abc"));
    }

    #[test]
    fn test_malformed_json_yields_none() {
        assert!(generate_json_schema(br#"{"name": "John", "age": 30"#).is_none());
        assert!(generate_json_schema(b"").is_none());
    }

    #[test]
    fn test_schema_roundtrips_through_serde() {
        let schema = JsonSchema::infer(&json!({"a": [true]}));
        let parsed: JsonSchema = serde_json::from_value(serde_json::to_value(&schema).unwrap()).unwrap();
        assert_eq!(parsed, schema);
    }
}
