//! JSON-RPC message types and the tool-result envelope

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

/// JSON-RPC request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// JSON-RPC version (always "2.0")
    pub jsonrpc: String,
    /// Request ID
    pub id: RequestId,
    /// Method name
    pub method: String,
    /// Parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// JSON-RPC response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// JSON-RPC version (always "2.0")
    pub jsonrpc: String,
    /// Request ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
    /// Result (on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error (on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Error code
    pub code: i64,
    /// Error message
    pub message: String,
    /// Optional error data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Request ID (string or number)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// String ID
    String(String),
    /// Numeric ID
    Number(i64),
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s}"),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

/// Tool descriptor returned by `tools/list`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    /// Tool name
    pub name: String,
    /// Human-readable description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema for the tool arguments
    #[serde(rename = "inputSchema", skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
}

/// `tools/list` result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsListResult {
    /// Available tools
    pub tools: Vec<Tool>,
    /// Pagination cursor
    #[serde(rename = "nextCursor", skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// Outcome of unwrapping a `tools/call` result envelope.
///
/// The gateway serializes the tool's own response as a JSON string inside
/// `result.content[0].text` (optionally nested under an `output` key). This
/// enum makes the unwrap branches explicit instead of probing shapes at each
/// call site; a text payload that fails to parse is an error, never a silent
/// raw string.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolPayload {
    /// The result carried no text envelope; raw result passed through
    Passthrough(Value),
    /// The embedded JSON payload (the `output` value when present)
    Unwrapped(Value),
}

impl ToolPayload {
    /// The payload value, whichever branch produced it
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::Passthrough(value) | Self::Unwrapped(value) => value,
        }
    }
}

/// Unwrap a `tools/call` result envelope.
///
/// - No `content[0].text` string: the raw result is passed through unchanged.
/// - `text` parses as JSON: the `output` value when present, otherwise the
///   parsed document.
/// - `text` is not valid JSON: `MalformedToolResponse`.
pub fn unwrap_tool_result(result: Value) -> Result<ToolPayload> {
    let Some(text) = result
        .get("content")
        .and_then(Value::as_array)
        .and_then(|items| items.first())
        .and_then(|item| item.get("text"))
        .and_then(Value::as_str)
    else {
        return Ok(ToolPayload::Passthrough(result));
    };

    let parsed: Value = serde_json::from_str(text).map_err(|e| {
        Error::MalformedToolResponse(format!("embedded content is not valid JSON: {e}"))
    })?;

    match parsed {
        Value::Object(mut map) => {
            if let Some(output) = map.remove("output") {
                Ok(ToolPayload::Unwrapped(output))
            } else {
                Ok(ToolPayload::Unwrapped(Value::Object(map)))
            }
        }
        other => Ok(ToolPayload::Unwrapped(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_serializes_envelope_fields() {
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: RequestId::String("tools/list-1".to_string()),
            method: "tools/list".to_string(),
            params: Some(json!({})),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["jsonrpc"], "2.0");
        assert_eq!(value["id"], "tools/list-1");
        assert_eq!(value["method"], "tools/list");
    }

    #[test]
    fn response_deserializes_error_member() {
        let response: JsonRpcResponse = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": -32601, "message": "Method not found"}
        }))
        .unwrap();
        let error = response.error.unwrap();
        assert_eq!(error.code, -32601);
        assert_eq!(error.message, "Method not found");
        assert!(response.result.is_none());
    }

    #[test]
    fn request_id_display() {
        assert_eq!(RequestId::Number(42).to_string(), "42");
        assert_eq!(RequestId::String("abc".to_string()).to_string(), "abc");
    }

    #[test]
    fn tools_list_result_deserializes() {
        let result: ToolsListResult = serde_json::from_value(json!({
            "tools": [
                {"name": "research___invokeCouncil", "description": "Run the council"},
                {"name": "research___invokeDxO"}
            ]
        }))
        .unwrap();
        assert_eq!(result.tools.len(), 2);
        assert_eq!(result.tools[0].name, "research___invokeCouncil");
        assert!(result.next_cursor.is_none());
    }

    // ── Envelope unwrap ───────────────────────────────────────────────

    #[test]
    fn unwrap_extracts_output_key() {
        let result = json!({
            "content": [{"type": "text", "text": r#"{"output":{"question":"Q"}}"#}]
        });
        let payload = unwrap_tool_result(result).unwrap();
        assert_eq!(payload, ToolPayload::Unwrapped(json!({"question": "Q"})));
        assert_eq!(payload.into_value(), json!({"question": "Q"}));
    }

    #[test]
    fn unwrap_returns_parsed_object_without_output_key() {
        let result = json!({
            "content": [{"type": "text", "text": r#"{"question":"Q"}"#}]
        });
        let payload = unwrap_tool_result(result).unwrap();
        assert_eq!(payload, ToolPayload::Unwrapped(json!({"question": "Q"})));
    }

    #[test]
    fn unwrap_rejects_non_json_text() {
        let result = json!({
            "content": [{"type": "text", "text": "not json"}]
        });
        let err = unwrap_tool_result(result).unwrap_err();
        assert!(matches!(err, Error::MalformedToolResponse(_)));
    }

    #[test]
    fn unwrap_passes_through_result_without_content() {
        let result = json!({"answer": 42});
        let payload = unwrap_tool_result(result.clone()).unwrap();
        assert_eq!(payload, ToolPayload::Passthrough(result));
    }

    #[test]
    fn unwrap_passes_through_empty_content_array() {
        let result = json!({"content": []});
        let payload = unwrap_tool_result(result.clone()).unwrap();
        assert_eq!(payload, ToolPayload::Passthrough(result));
    }

    #[test]
    fn unwrap_passes_through_non_string_text() {
        let result = json!({"content": [{"text": 7}]});
        let payload = unwrap_tool_result(result.clone()).unwrap();
        assert_eq!(payload, ToolPayload::Passthrough(result));
    }

    #[test]
    fn unwrap_accepts_non_object_json_payload() {
        let result = json!({"content": [{"text": "[1,2,3]"}]});
        let payload = unwrap_tool_result(result).unwrap();
        assert_eq!(payload, ToolPayload::Unwrapped(json!([1, 2, 3])));
    }
}
