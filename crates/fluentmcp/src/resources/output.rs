//! Normalization of resource handler output into a `resources/read` result.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::Value;

use crate::types::{McpError, McpResult, ReadResourceResult, ResourceContent};

/// What a resource handler produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceOutput {
    Text(String),
    /// Raw bytes, sent base64-encoded.
    Blob(Vec<u8>),
    /// A complete `resources/read` result, checked for shape and passed through.
    Prebuilt(Value),
}

impl ResourceOutput {
    pub fn text(text: impl Into<String>) -> Self {
        ResourceOutput::Text(text.into())
    }

    /// Build the JSON result for the resource at `uri`, tagging content with
    /// the declared MIME type.
    pub fn into_result(self, uri: &str, mime_type: Option<&str>) -> McpResult<Value> {
        let content = match self {
            ResourceOutput::Text(text) => ResourceContent {
                uri: uri.to_string(),
                mime_type: mime_type.map(str::to_string),
                text: Some(text),
                blob: None,
            },
            ResourceOutput::Blob(bytes) => ResourceContent {
                uri: uri.to_string(),
                mime_type: mime_type.map(str::to_string),
                text: None,
                blob: Some(STANDARD.encode(bytes)),
            },
            ResourceOutput::Prebuilt(value) => {
                serde_json::from_value::<ReadResourceResult>(value.clone()).map_err(|e| {
                    McpError::InvalidResourceResult {
                        uri: uri.to_string(),
                        reason: e.to_string(),
                    }
                })?;
                return Ok(value);
            }
        };
        serde_json::to_value(ReadResourceResult {
            contents: vec![content],
        })
        .map_err(|e| McpError::InternalError(e.to_string()))
    }
}

impl From<String> for ResourceOutput {
    fn from(text: String) -> Self {
        ResourceOutput::Text(text)
    }
}

impl From<&str> for ResourceOutput {
    fn from(text: &str) -> Self {
        ResourceOutput::Text(text.to_string())
    }
}

impl From<Vec<u8>> for ResourceOutput {
    fn from(bytes: Vec<u8>) -> Self {
        ResourceOutput::Blob(bytes)
    }
}
