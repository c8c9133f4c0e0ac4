//! Deterministic mock values
//!
//! Returned instead of vendor calls when the config's execution mode is
//! `mock`. No network state is touched.

use serde_json::{json, Map, Value};

use crate::embeddings::normalize;
use crate::types::{last_user_text, ChatMessage};

/// Dimensions of mock embedding vectors
pub const MOCK_EMBEDDING_DIMENSIONS: usize = 16;

const MAX_DEPTH: usize = 16;

/// Echo of the last user message
pub fn mock_text(messages: &[ChatMessage]) -> String {
    format!("Mock response: {}", last_user_text(messages).unwrap_or_default())
}

/// A value shaped like `schema`
///
/// Takes the first `const`/`enum` value where present; otherwise strings are
/// "mock", numbers their minimum or zero, booleans false, arrays as short as
/// `minItems` allows, and objects carry every declared property. Local `$ref`s
/// are followed.
pub fn mock_value(schema: &Value) -> Value {
    value_for(schema, schema, 0)
}

fn value_for(schema: &Value, root: &Value, depth: usize) -> Value {
    if depth > MAX_DEPTH {
        return Value::Null;
    }
    let Some(obj) = schema.as_object() else {
        return Value::Null;
    };

    if let Some(target) = obj
        .get("$ref")
        .and_then(Value::as_str)
        .and_then(|r| r.strip_prefix('#'))
        .and_then(|pointer| root.pointer(pointer))
    {
        return value_for(target, root, depth + 1);
    }
    if let Some(value) = obj.get("const") {
        return value.clone();
    }
    if let Some(first) = obj.get("enum").and_then(Value::as_array).and_then(|v| v.first()) {
        return first.clone();
    }
    for key in ["anyOf", "oneOf", "allOf"] {
        if let Some(first) = obj.get(key).and_then(Value::as_array).and_then(|v| v.first()) {
            return value_for(first, root, depth + 1);
        }
    }

    let ty = match obj.get("type") {
        Some(Value::String(t)) => Some(t.as_str()),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|t| *t != "null")
            .or(Some("null")),
        _ if obj.contains_key("properties") => Some("object"),
        _ => None,
    };

    match ty {
        Some("string") => {
            let min = obj.get("minLength").and_then(Value::as_u64).unwrap_or(0) as usize;
            let mut s = "mock".to_string();
            while s.chars().count() < min {
                s.push('x');
            }
            Value::String(s)
        }
        Some("integer") => {
            let min = obj.get("minimum").and_then(Value::as_i64).unwrap_or(0);
            json!(min.max(0))
        }
        Some("number") => {
            let min = obj.get("minimum").and_then(Value::as_f64).unwrap_or(0.0);
            json!(min.max(0.0))
        }
        Some("boolean") => Value::Bool(false),
        Some("array") => {
            let n = obj.get("minItems").and_then(Value::as_u64).unwrap_or(0) as usize;
            let item_schema = obj.get("items").cloned().unwrap_or(Value::Null);
            Value::Array(
                (0..n)
                    .map(|_| value_for(&item_schema, root, depth + 1))
                    .collect(),
            )
        }
        Some("object") => {
            let mut out = Map::new();
            if let Some(props) = obj.get("properties").and_then(Value::as_object) {
                for (name, prop) in props {
                    out.insert(name.clone(), value_for(prop, root, depth + 1));
                }
            }
            Value::Object(out)
        }
        _ => Value::Null,
    }
}

/// Unit vector derived from the bytes of `text`
pub fn mock_embedding(text: &str) -> Vec<f32> {
    // FNV-1a seed, then an LCG per dimension
    let mut state = text
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325u64, |h, b| (h ^ b as u64).wrapping_mul(0x0100_0000_01b3));
    let raw: Vec<f32> = (0..MOCK_EMBEDDING_DIMENSIONS)
        .map(|_| {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            ((state >> 40) as f32 / (1u64 << 24) as f32) * 2.0 - 1.0
        })
        .collect();
    normalize(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::magnitude;
    use crate::schema;

    #[test]
    fn test_mock_text_echoes_last_user_message() {
        let messages = vec![
            ChatMessage::system("be brief"),
            ChatMessage::user("first"),
            ChatMessage::assistant("ok"),
            ChatMessage::user("second"),
        ];
        assert_eq!(mock_text(&messages), "Mock response: second");
        assert_eq!(mock_text(&[]), "Mock response: ");
    }

    #[test]
    fn test_mock_value_satisfies_schema() {
        let schema = json!({
            "type": "object",
            "properties": {
                "label": { "type": "string", "enum": ["positive", "negative"] },
                "score": { "type": "number", "minimum": 0, "maximum": 1 },
                "tags": { "type": "array", "items": { "type": "string", "minLength": 6 }, "minItems": 2 },
                "flagged": { "type": "boolean" },
                "count": { "type": "integer", "minimum": 3 },
                "note": { "type": ["string", "null"] },
                "owner": { "$ref": "#/$defs/Owner" }
            },
            "required": ["label", "score", "tags", "flagged", "count", "owner"],
            "$defs": {
                "Owner": {
                    "type": "object",
                    "properties": { "name": { "type": "string" } },
                    "required": ["name"]
                }
            }
        });

        let value = mock_value(&schema);
        assert_eq!(value["label"], "positive");
        assert_eq!(value["tags"], json!(["mockxx", "mockxx"]));
        assert_eq!(value["count"], 3);
        assert_eq!(value["owner"]["name"], "mock");
        schema::validate(&schema, &value).unwrap();
    }

    #[test]
    fn test_mock_embedding_deterministic_unit() {
        let a = mock_embedding("hello");
        assert_eq!(a.len(), MOCK_EMBEDDING_DIMENSIONS);
        assert_eq!(a, mock_embedding("hello"));
        assert_ne!(a, mock_embedding("hello!"));
        assert!((magnitude(&a) - 1.0).abs() < 1e-5);
    }
}
