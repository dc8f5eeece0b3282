//! Normalization of prompt handler output into a `prompts/get` result.

use serde_json::Value;

use crate::types::{McpError, McpResult, PromptGetResult, PromptMessage};

/// What a prompt handler produced.
#[derive(Debug, Clone, PartialEq)]
pub enum PromptOutput {
    /// Wrapped as a single user message.
    PlainText(String),
    /// Sent as-is, order preserved.
    Messages(Vec<PromptMessage>),
    /// A complete `prompts/get` result, checked for shape and passed through.
    Prebuilt(Value),
}

impl PromptOutput {
    pub fn text(text: impl Into<String>) -> Self {
        PromptOutput::PlainText(text.into())
    }

    pub fn messages<I, M>(messages: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<PromptMessage>,
    {
        PromptOutput::Messages(messages.into_iter().map(Into::into).collect())
    }

    /// Build the JSON result for prompt `name`.
    pub fn into_result(self, name: &str, description: Option<&str>) -> McpResult<Value> {
        let result = match self {
            PromptOutput::PlainText(text) => PromptGetResult {
                description: description.map(str::to_string),
                messages: vec![PromptMessage::user(text)],
            },
            PromptOutput::Messages(messages) => PromptGetResult {
                description: description.map(str::to_string),
                messages,
            },
            PromptOutput::Prebuilt(value) => {
                serde_json::from_value::<PromptGetResult>(value.clone()).map_err(|e| {
                    McpError::InvalidPromptResult {
                        name: name.to_string(),
                        reason: e.to_string(),
                    }
                })?;
                return Ok(value);
            }
        };
        serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
    }
}

impl From<String> for PromptOutput {
    fn from(text: String) -> Self {
        PromptOutput::PlainText(text)
    }
}

impl From<&str> for PromptOutput {
    fn from(text: &str) -> Self {
        PromptOutput::PlainText(text.to_string())
    }
}

impl From<Vec<PromptMessage>> for PromptOutput {
    fn from(messages: Vec<PromptMessage>) -> Self {
        PromptOutput::Messages(messages)
    }
}
