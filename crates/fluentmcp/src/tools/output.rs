//! Normalization of tool handler output into `CallToolResult`.

use serde_json::Value;

use crate::types::{CallToolResult, ToolContent};

/// What a tool handler produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    /// A single text block.
    Text(String),
    /// Content blocks, passed through in order.
    Content(Vec<ToolContent>),
    /// A JSON value, rendered as a pretty-printed text block.
    Json(Value),
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        ToolOutput::Text(text.into())
    }

    pub fn into_call_result(self) -> CallToolResult {
        match self {
            ToolOutput::Text(text) => CallToolResult::text(text),
            ToolOutput::Content(content) => CallToolResult::success(content),
            ToolOutput::Json(value) => {
                let text = serde_json::to_string_pretty(&value).unwrap_or_else(|e| e.to_string());
                CallToolResult::text(text)
            }
        }
    }
}

impl From<String> for ToolOutput {
    fn from(text: String) -> Self {
        ToolOutput::Text(text)
    }
}

impl From<&str> for ToolOutput {
    fn from(text: &str) -> Self {
        ToolOutput::Text(text.to_string())
    }
}

impl From<Value> for ToolOutput {
    fn from(value: Value) -> Self {
        ToolOutput::Json(value)
    }
}
