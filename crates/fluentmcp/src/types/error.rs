//! Error types and JSON-RPC error codes for the MCP server.

use std::time::Duration;

use serde_json::{json, Value};

use super::message::{JsonRpcError, JsonRpcErrorObject, RequestId, JSONRPC_VERSION};

/// Standard JSON-RPC 2.0 error codes.
pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
}

/// MCP-specific error codes.
pub mod mcp_error_codes {
    /// Server: request received before the `initialize` handshake completed.
    pub const NOT_INITIALIZED: i32 = -32002;
    pub const RESOURCE_NOT_FOUND: i32 = -32802;
    pub const TOOL_NOT_FOUND: i32 = -32803;
    pub const PROMPT_NOT_FOUND: i32 = -32804;
    pub const HANDLER_TIMEOUT: i32 = -32805;
}

/// All errors that can occur in the MCP server.
#[derive(thiserror::Error, Debug)]
pub enum McpError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Server not initialized: received '{0}' before initialize completed")]
    NotInitialized(String),

    #[error("Unsupported protocol version: {requested}")]
    UnsupportedProtocolVersion {
        requested: String,
        supported: Vec<String>,
    },

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Prompt not found: {0}")]
    PromptNotFound(String),

    #[error("Invalid prompt result from '{name}': {reason}")]
    InvalidPromptResult { name: String, reason: String },

    #[error("Invalid resource result from '{uri}': {reason}")]
    InvalidResourceResult { uri: String, reason: String },

    #[error("Handler for '{target}' timed out after {}ms", .after.as_millis())]
    HandlerTimeout { target: String, after: Duration },

    #[error("Duplicate {kind} registration: {name}")]
    DuplicateName { kind: &'static str, name: String },

    #[error("Schema error: {0}")]
    Schema(#[from] fluentmcp_schema::SchemaError),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl McpError {
    pub fn code(&self) -> i32 {
        use error_codes::*;
        use mcp_error_codes::*;
        match self {
            McpError::InvalidRequest(_) => INVALID_REQUEST,
            McpError::MethodNotFound(_) => METHOD_NOT_FOUND,
            McpError::InvalidParams(_) => INVALID_PARAMS,
            McpError::InternalError(_) => INTERNAL_ERROR,
            McpError::NotInitialized(_) => NOT_INITIALIZED,
            McpError::UnsupportedProtocolVersion { .. } => INVALID_PARAMS,
            McpError::ResourceNotFound(_) => RESOURCE_NOT_FOUND,
            McpError::ToolNotFound(_) => TOOL_NOT_FOUND,
            McpError::PromptNotFound(_) => PROMPT_NOT_FOUND,
            McpError::InvalidPromptResult { .. } | McpError::InvalidResourceResult { .. } => {
                INTERNAL_ERROR
            }
            McpError::HandlerTimeout { .. } => HANDLER_TIMEOUT,
            McpError::DuplicateName { .. } => INTERNAL_ERROR,
            McpError::Schema(_) => INVALID_PARAMS,
            McpError::Transport(_) | McpError::Io(_) => INTERNAL_ERROR,
            McpError::Json(_) => PARSE_ERROR,
        }
    }

    /// Structured `data` attached to the error response, if any.
    pub fn data(&self) -> Option<Value> {
        match self {
            McpError::UnsupportedProtocolVersion {
                requested,
                supported,
            } => Some(json!({ "supported": supported, "requested": requested })),
            _ => None,
        }
    }

    pub fn to_json_rpc_error(&self, id: RequestId) -> JsonRpcError {
        JsonRpcError {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            error: JsonRpcErrorObject {
                code: self.code(),
                message: self.to_string(),
                data: self.data(),
            },
        }
    }
}

pub type McpResult<T> = Result<T, McpError>;
