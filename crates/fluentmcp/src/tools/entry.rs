//! A registered tool: name, schema, and async handler.

use std::future::Future;
use std::sync::Arc;

use fluentmcp_schema::{SchemaDescriptor, ToolInput};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::handler::{Arguments, BoxFuture, HandlerResult};
use crate::types::{McpResult, ToolDefinition};

use super::output::ToolOutput;

type ToolFn = Arc<dyn Fn(Arguments) -> BoxFuture<HandlerResult<ToolOutput>> + Send + Sync>;

#[derive(Clone)]
pub struct ToolEntry {
    name: String,
    description: Option<String>,
    schema: SchemaDescriptor,
    handler: ToolFn,
}

impl ToolEntry {
    /// Register a tool whose handler receives the validated argument map.
    pub fn new<F, Fut>(name: impl Into<String>, schema: SchemaDescriptor, handler: F) -> Self
    where
        F: Fn(Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<ToolOutput>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: None,
            schema,
            handler: Arc::new(move |args: Arguments| -> BoxFuture<HandlerResult<ToolOutput>> {
                Box::pin(handler(args))
            }),
        }
    }

    /// Register a tool whose arguments are deserialized into `T`.
    ///
    /// The schema comes from `T::schema()`. Arguments that pass validation
    /// but fail to deserialize surface as a handler error.
    pub fn typed<T, F, Fut>(name: impl Into<String>, handler: F) -> McpResult<Self>
    where
        T: ToolInput + DeserializeOwned + Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<ToolOutput>> + Send + 'static,
    {
        let schema = T::schema()?;
        let handler = Arc::new(handler);
        Ok(Self::new(name, schema, move |args: Arguments| {
            let handler = Arc::clone(&handler);
            async move {
                let input: T = serde_json::from_value(Value::Object(args))
                    .map_err(|e| anyhow::anyhow!("Invalid arguments: {e}"))?;
                (*handler)(input).await
            }
        }))
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn schema(&self) -> &SchemaDescriptor {
        &self.schema
    }

    /// Metadata exposed by `tools/list`.
    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: self.schema.to_json_schema(),
        }
    }

    pub fn invoke(&self, args: Arguments) -> BoxFuture<HandlerResult<ToolOutput>> {
        (self.handler)(args)
    }
}

impl std::fmt::Debug for ToolEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolEntry")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}
