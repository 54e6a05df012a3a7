//! Validate tool call arguments against a tool's declared parameters.

use super::spec::{ParameterKind, ToolSpec};

/// Validate tool arguments against a [`ToolSpec`].
///
/// Checks object shape, required presence, undeclared fields, property types
/// and the per-parameter constraints. Returns `Err(message)` describing the
/// first violation found.
pub fn validate_arguments(args: &serde_json::Value, spec: &ToolSpec) -> Result<(), String> {
    let Some(obj) = args.as_object() else {
        return Err(format!(
            "expected object arguments, got {}",
            json_type_name(args)
        ));
    };

    for param in spec.parameters.iter().filter(|p| p.required) {
        if !obj.contains_key(&param.name) {
            return Err(format!("missing required field '{}'", param.name));
        }
    }

    for (key, value) in obj {
        let Some(param) = spec.parameter(key) else {
            return Err(format!("unexpected field '{key}'"));
        };
        // Optional parameters may be sent as explicit nulls.
        if value.is_null() && !param.required {
            continue;
        }
        check_value(key, value, &param.kind)?;
    }

    Ok(())
}

fn check_value(key: &str, value: &serde_json::Value, kind: &ParameterKind) -> Result<(), String> {
    match kind {
        ParameterKind::String { max_length } => {
            let Some(text) = value.as_str() else {
                return Err(type_mismatch(key, kind, value));
            };
            if let Some(max) = max_length {
                let len = text.chars().count();
                if len > *max {
                    return Err(format!(
                        "field '{key}' must be at most {max} characters, got {len}"
                    ));
                }
            }
        }
        ParameterKind::Integer { minimum, maximum } => {
            let Some(number) = value.as_i64() else {
                return Err(type_mismatch(key, kind, value));
            };
            if minimum.is_some_and(|min| number < min) || maximum.is_some_and(|max| number > max) {
                return Err(format!(
                    "field '{key}' must be {}, got {number}",
                    describe_range(*minimum, *maximum)
                ));
            }
        }
        ParameterKind::Boolean => {
            if !value.is_boolean() {
                return Err(type_mismatch(key, kind, value));
            }
        }
    }
    Ok(())
}

fn type_mismatch(key: &str, kind: &ParameterKind, value: &serde_json::Value) -> String {
    format!(
        "field '{}' expected type '{}', got {}",
        key,
        kind.json_type(),
        json_type_name(value)
    )
}

fn describe_range(minimum: Option<i64>, maximum: Option<i64>) -> String {
    match (minimum, maximum) {
        (Some(min), Some(max)) => format!("between {min} and {max}"),
        (Some(min), None) => format!("at least {min}"),
        (None, Some(max)) => format!("at most {max}"),
        (None, None) => "an integer".to_string(),
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
