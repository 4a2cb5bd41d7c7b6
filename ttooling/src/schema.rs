//! Normalization of backend-supplied parameter schemas.

use serde_json::{Map, Value};
use tprovider::ToolSchema;

use crate::ToolError;

/// Schema used when a backend advertises a tool without one.
pub fn empty_object_schema() -> ToolSchema {
    let mut schema = Map::new();
    schema.insert("type".to_string(), Value::String("object".to_string()));
    schema.insert("properties".to_string(), Value::Object(Map::new()));
    schema
}

/// Turns a raw `inputSchema` into a schema object.
///
/// Strings are parsed as JSON. Anything that does not end up as a JSON
/// object is rejected.
pub fn normalize_schema(tool_name: &str, raw: Option<Value>) -> Result<ToolSchema, ToolError> {
    let value = match raw {
        None | Some(Value::Null) => return Ok(empty_object_schema()),
        Some(Value::String(encoded)) if encoded.trim().is_empty() => {
            return Ok(empty_object_schema());
        }
        Some(Value::String(encoded)) => serde_json::from_str::<Value>(&encoded).map_err(|err| {
            ToolError::invalid_schema(format!("schema is not valid JSON: {err}"))
                .with_tool_name(tool_name)
        })?,
        Some(value) => value,
    };

    match value {
        Value::Object(schema) => Ok(schema),
        other => Err(ToolError::invalid_schema(format!(
            "schema must be a JSON object, got {}",
            json_kind(&other)
        ))
        .with_tool_name(tool_name)),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
