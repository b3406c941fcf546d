//! JSON-RPC 2.0 message types
//!
//! One message per line on the transport. A request without an `id` is a
//! notification and gets no response.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::McpError;

pub const JSONRPC_VERSION: &str = "2.0";

/// MCP protocol revision this server speaks
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Incoming request or notification
#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

impl Request {
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// Parse one line from the transport
    pub fn parse(line: &str) -> Result<Self, McpError> {
        let value: Value =
            serde_json::from_str(line).map_err(|e| McpError::Parse(e.to_string()))?;
        let request: Request = serde_json::from_value(value)
            .map_err(|e| McpError::InvalidRequest(e.to_string()))?;
        if request.jsonrpc != JSONRPC_VERSION {
            return Err(McpError::InvalidRequest(format!(
                "unsupported jsonrpc version {:?}",
                request.jsonrpc
            )));
        }
        Ok(request)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: i64,
    pub message: String,
}

/// Outgoing response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
}

impl Response {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, err: &McpError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(ErrorObject {
                code: err.code(),
                message: err.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request_and_notification() {
        let request = Request::parse(r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#).unwrap();
        assert_eq!(request.method, "tools/list");
        assert!(!request.is_notification());
        assert!(request.params.is_null());

        let note =
            Request::parse(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#).unwrap();
        assert!(note.is_notification());
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(Request::parse("{nope"), Err(McpError::Parse(_))));
        assert!(matches!(
            Request::parse(r#"{"jsonrpc":"2.0","id":1}"#),
            Err(McpError::InvalidRequest(_))
        ));
        assert!(matches!(
            Request::parse(r#"{"jsonrpc":"1.0","id":1,"method":"ping"}"#),
            Err(McpError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_failure_shape() {
        let response = Response::failure(Value::from(7), &McpError::MethodNotFound("foo".into()));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["error"]["code"], -32601);
        assert_eq!(json["id"], 7);
        assert!(json.get("result").is_none());
    }
}
