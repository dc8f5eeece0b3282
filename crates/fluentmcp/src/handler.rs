//! Handler signatures shared by tools, prompts, and resources.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use serde_json::{Map, Value};

/// A boxed, `'static` future returned by registered handlers.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// Tool-call arguments after validation and coercion.
pub type Arguments = Map<String, Value>;

/// Prompt arguments. MCP prompt arguments are string-valued.
pub type PromptArguments = HashMap<String, String>;

/// Result type handlers return. Any error type convertible to
/// `anyhow::Error` can be propagated with `?`.
pub type HandlerResult<T> = anyhow::Result<T>;
