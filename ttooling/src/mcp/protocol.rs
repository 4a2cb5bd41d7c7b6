//! JSON-RPC 2.0 framing and MCP payload decoding.

use serde::Deserialize;
use serde_json::{Value, json};

use crate::{BackendToolInfo, CallToolOutcome, ContentBlock, ToolError};

pub(crate) const PROTOCOL_VERSION: &str = "2025-06-18";
pub(crate) const METHOD_NOT_FOUND: i64 = -32601;

pub(crate) fn request(id: &str, method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params,
    })
}

pub(crate) fn notification(method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params,
    })
}

pub(crate) fn initialize_params() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "clientInfo": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
        },
        "capabilities": {},
    })
}

/// Builds the reply to a request the server sent us.
pub(crate) fn server_request_reply(id: Value, method: &str) -> Value {
    match method {
        "ping" => json!({"jsonrpc": "2.0", "id": id, "result": {}}),
        other => json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": {
                "code": METHOD_NOT_FOUND,
                "message": format!("client does not implement method '{other}'"),
            },
        }),
    }
}

#[derive(Debug, PartialEq)]
pub(crate) enum Inbound {
    Response {
        id: String,
        outcome: Result<Value, RpcError>,
    },
    Request {
        id: Value,
        method: String,
    },
    Notification {
        method: String,
    },
    Unrecognized,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RpcError {
    pub code: i64,
    pub message: String,
}

pub(crate) fn classify(mut value: Value) -> Inbound {
    let method = value
        .get("method")
        .and_then(Value::as_str)
        .map(str::to_string);
    let id = value.get_mut("id").map(Value::take);

    match (id, method) {
        (Some(id), Some(method)) => Inbound::Request { id, method },
        (None, Some(method)) => Inbound::Notification { method },
        (Some(id), None) => {
            let Some(id) = response_key(&id) else {
                return Inbound::Unrecognized;
            };
            let outcome = match value.get("error") {
                Some(error) => Err(RpcError {
                    code: error.get("code").and_then(Value::as_i64).unwrap_or(-32000),
                    message: error
                        .get("message")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown error")
                        .to_string(),
                }),
                None => Ok(value.get_mut("result").map(Value::take).unwrap_or(Value::Null)),
            };
            Inbound::Response { id, outcome }
        }
        (None, None) => Inbound::Unrecognized,
    }
}

fn response_key(id: &Value) -> Option<String> {
    match id {
        Value::String(value) => Some(value.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct ToolsPage {
    #[serde(default)]
    tools: Vec<ListedTool>,
    #[serde(rename = "nextCursor", default)]
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListedTool {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(rename = "inputSchema", default)]
    input_schema: Option<Value>,
}

pub(crate) fn parse_tools_page(
    result: Value,
) -> Result<(Vec<BackendToolInfo>, Option<String>), ToolError> {
    let page: ToolsPage = serde_json::from_value(result)
        .map_err(|err| ToolError::transport(format!("malformed tools/list result: {err}")))?;

    let tools = page
        .tools
        .into_iter()
        .map(|tool| BackendToolInfo {
            name: tool.name,
            description: tool.description,
            input_schema: tool.input_schema,
        })
        .collect();

    let cursor = page.next_cursor.filter(|cursor| !cursor.is_empty());
    Ok((tools, cursor))
}

#[derive(Debug, Deserialize)]
struct CallResult {
    #[serde(default)]
    content: Vec<Value>,
    #[serde(rename = "isError", default)]
    is_error: bool,
}

pub(crate) fn parse_call_result(result: Value) -> Result<CallToolOutcome, ToolError> {
    let parsed: CallResult = serde_json::from_value(result)
        .map_err(|err| ToolError::result_malformed(format!("malformed tools/call result: {err}")))?;

    Ok(CallToolOutcome {
        content: parsed.content.iter().map(ContentBlock::from_value).collect(),
        is_error: parsed.is_error,
    })
}
