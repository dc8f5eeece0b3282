//! Server instance and its fluent builder.

use std::future::Future;
use std::sync::Arc;

use fluentmcp_schema::ToolInput;
use serde::de::DeserializeOwned;

use crate::config::ServerConfig;
use crate::handler::HandlerResult;
use crate::prompts::PromptEntry;
use crate::protocol::{server_capabilities, Dispatcher, Negotiator};
use crate::registry::Registry;
use crate::resources::ResourceEntry;
use crate::session::SessionRunner;
use crate::tools::{ToolEntry, ToolOutput};
use crate::transport::StdioTransport;
use crate::types::{Implementation, McpError, McpResult, ServerCapabilities};

/// A configured server with a frozen registry. Each connection gets its own
/// dispatcher and session; the registry is shared.
#[derive(Debug, Clone)]
pub struct McpServer {
    registry: Arc<Registry>,
    negotiator: Arc<Negotiator>,
    config: Arc<ServerConfig>,
}

impl McpServer {
    pub fn builder(config: ServerConfig) -> ServerBuilder {
        ServerBuilder::new(config)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn capabilities(&self) -> &ServerCapabilities {
        self.negotiator.capabilities()
    }

    pub fn server_info(&self) -> &Implementation {
        self.negotiator.server_info()
    }

    /// A dispatcher over a fresh session.
    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.negotiator),
            self.config.handler_timeout(),
        )
    }

    /// A runner for one connection.
    pub fn session_runner(&self) -> SessionRunner {
        SessionRunner::new(
            self.dispatcher(),
            self.config.concurrent,
            self.config.runner_limits(),
        )
    }

    pub async fn serve_stdio(&self) -> McpResult<()> {
        tracing::info!(
            "{} v{} serving {} tool(s), {} prompt(s), {} resource(s)",
            self.config.name,
            self.config.version,
            self.registry.tools().len(),
            self.registry.prompts().len(),
            self.registry.resources().len()
        );
        StdioTransport::new(self.session_runner()).run().await
    }
}

/// Collects registrations. The first failure is kept and reported by
/// [`ServerBuilder::build`].
#[derive(Debug)]
pub struct ServerBuilder {
    config: ServerConfig,
    registry: Registry,
    error: Option<McpError>,
}

impl ServerBuilder {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            registry: Registry::new(),
            error: None,
        }
    }

    pub fn tool(mut self, entry: ToolEntry) -> Self {
        let result = self.registry.register_tool(entry);
        self.record(result);
        self
    }

    /// Register a tool whose input schema comes from `T`.
    pub fn typed_tool<T, F, Fut>(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        handler: F,
    ) -> Self
    where
        T: ToolInput + DeserializeOwned + Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<ToolOutput>> + Send + 'static,
    {
        match ToolEntry::typed(name, handler) {
            Ok(entry) => self.tool(entry.with_description(description)),
            Err(e) => {
                self.record(Err(e));
                self
            }
        }
    }

    pub fn prompt(mut self, entry: PromptEntry) -> Self {
        let result = self.registry.register_prompt(entry);
        self.record(result);
        self
    }

    pub fn resource(mut self, entry: ResourceEntry) -> Self {
        let result = self.registry.register_resource(entry);
        self.record(result);
        self
    }

    pub fn build(self) -> McpResult<McpServer> {
        if let Some(e) = self.error {
            return Err(e);
        }

        let capabilities = server_capabilities(&self.registry, &self.config.list_changed);
        let negotiator = Negotiator::new(
            self.config.protocol_versions.clone(),
            capabilities,
            Implementation {
                name: self.config.name.clone(),
                version: self.config.version.clone(),
            },
            self.config.instructions.clone(),
        );

        Ok(McpServer {
            registry: Arc::new(self.registry),
            negotiator: Arc::new(negotiator),
            config: Arc::new(self.config),
        })
    }

    fn record(&mut self, result: McpResult<()>) {
        if let Err(e) = result {
            if self.error.is_none() {
                self.error = Some(e);
            }
        }
    }
}
