//! Error types for the protocol server

use jpfin_agent::AgentError;
use thiserror::Error;

/// Errors that can occur while serving requests
#[derive(Error, Debug)]
pub enum McpError {
    /// The request line is not valid JSON
    #[error("Parse error: {0}")]
    Parse(String),

    /// The JSON is not a valid JSON-RPC request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Unknown method
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// Malformed method or tool parameters
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// No tool registered under the requested name
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// The tool rejected its input or could not run
    #[error(transparent)]
    Agent(#[from] AgentError),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error on the transport
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl McpError {
    /// JSON-RPC error code
    pub fn code(&self) -> i64 {
        match self {
            McpError::Parse(_) => -32700,
            McpError::InvalidRequest(_) => -32600,
            McpError::MethodNotFound(_) => -32601,
            McpError::InvalidParams(_) | McpError::ToolNotFound(_) => -32602,
            McpError::Agent(_) | McpError::Json(_) | McpError::Io(_) => -32603,
        }
    }

    /// Whether the error belongs in a tool result rather than a protocol error
    pub fn is_tool_error(&self) -> bool {
        matches!(self, McpError::Agent(_) | McpError::InvalidParams(_))
    }
}
