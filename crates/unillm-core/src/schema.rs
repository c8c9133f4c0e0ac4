//! JSON Schema validation shared by tool input checks and structured output

use serde_json::Value;

/// Maximum number of violations reported in one message
const MAX_REPORTED_ERRORS: usize = 3;

/// Validate `instance` against `schema`
///
/// Non-object schemas (including `null`) accept everything. On failure the
/// returned string joins up to three violations with their instance paths.
pub fn validate(schema: &Value, instance: &Value) -> Result<(), String> {
    if !schema.is_object() {
        return Ok(());
    }

    let compiled = jsonschema::validator_for(schema)
        .map_err(|e| format!("Invalid JSON Schema: {}", e))?;

    let msgs: Vec<String> = compiled
        .iter_errors(instance)
        .take(MAX_REPORTED_ERRORS)
        .map(|err| {
            let path = err.instance_path.to_string();
            if path.is_empty() {
                err.to_string()
            } else {
                format!("{} at {}", err, path)
            }
        })
        .collect();

    if msgs.is_empty() {
        Ok(())
    } else {
        Err(msgs.join("; "))
    }
}

/// Check that a schema compiles
pub fn check_schema(schema: &Value) -> Result<(), String> {
    if !schema.is_object() {
        return Ok(());
    }
    jsonschema::validator_for(schema)
        .map(|_| ())
        .map_err(|e| format!("Invalid JSON Schema: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn add_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "a": { "type": "number" },
                "b": { "type": "number" }
            },
            "required": ["a", "b"]
        })
    }

    #[test]
    fn test_valid_instance() {
        assert!(validate(&add_schema(), &json!({ "a": 1, "b": 2 })).is_ok());
    }

    #[test]
    fn test_missing_required() {
        let err = validate(&add_schema(), &json!({ "a": 1 })).unwrap_err();
        assert!(err.contains("b"), "unexpected message: {}", err);
    }

    #[test]
    fn test_wrong_type_reports_path() {
        let err = validate(&add_schema(), &json!({ "a": "one", "b": 2 })).unwrap_err();
        assert!(err.contains("/a"), "unexpected message: {}", err);
    }

    #[test]
    fn test_non_object_schema_accepts_anything() {
        assert!(validate(&Value::Null, &json!([1, 2, 3])).is_ok());
    }

    #[test]
    fn test_invalid_schema() {
        let bad = json!({ "type": "not-a-type" });
        assert!(check_schema(&bad).is_err());
        assert!(check_schema(&add_schema()).is_ok());
    }
}
