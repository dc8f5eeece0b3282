//! MCP capability negotiation during initialization.

use serde_json::Value;

use crate::config::ListChangedConfig;
use crate::registry::Registry;
use crate::session::{Session, SessionState};
use crate::types::{
    Implementation, InitializeParams, InitializeResult, McpError, McpResult, PromptsCapability,
    ResourcesCapability, ServerCapabilities, ToolsCapability,
};

/// Union of the features this server enables: a kind is advertised when at
/// least one entry of that kind is registered.
pub fn server_capabilities(registry: &Registry, list_changed: &ListChangedConfig) -> ServerCapabilities {
    ServerCapabilities {
        prompts: (!registry.prompts().is_empty()).then(|| PromptsCapability {
            list_changed: list_changed.prompts,
        }),
        resources: (!registry.resources().is_empty()).then(|| ResourcesCapability {
            list_changed: list_changed.resources,
        }),
        tools: (!registry.tools().is_empty()).then(|| ToolsCapability {
            list_changed: list_changed.tools,
        }),
    }
}

/// Runs the `initialize` handshake against a session.
#[derive(Debug, Clone)]
pub struct Negotiator {
    supported_versions: Vec<String>,
    capabilities: ServerCapabilities,
    server_info: Implementation,
    instructions: Option<String>,
}

impl Negotiator {
    pub fn new(
        supported_versions: Vec<String>,
        capabilities: ServerCapabilities,
        server_info: Implementation,
        instructions: Option<String>,
    ) -> Self {
        Self {
            supported_versions,
            capabilities,
            server_info,
            instructions,
        }
    }

    pub fn supported_versions(&self) -> &[String] {
        &self.supported_versions
    }

    pub fn capabilities(&self) -> &ServerCapabilities {
        &self.capabilities
    }

    pub fn server_info(&self) -> &Implementation {
        &self.server_info
    }

    /// Validate `initialize` params and move the session to Ready.
    ///
    /// On any failure the session goes back to Uninitialized so the client
    /// can retry.
    pub fn negotiate(&self, session: &mut Session, params: Option<Value>) -> McpResult<InitializeResult> {
        match session.state() {
            SessionState::Uninitialized => {}
            SessionState::Ready => {
                return Err(McpError::InvalidRequest(
                    "Session is already initialized".to_string(),
                ))
            }
            state => {
                return Err(McpError::InvalidRequest(format!(
                    "Cannot initialize a session that is {state}"
                )))
            }
        }

        session.begin_initialize();

        match self.validate(params) {
            Ok(init) => {
                tracing::info!(
                    "Initialized with client: {} v{} (protocol {})",
                    init.client_info.name,
                    init.client_info.version,
                    init.protocol_version
                );
                session.complete_initialize(
                    init.protocol_version.clone(),
                    init.client_info,
                    init.capabilities,
                    self.capabilities.clone(),
                );
                Ok(InitializeResult {
                    protocol_version: init.protocol_version,
                    capabilities: self.capabilities.clone(),
                    server_info: self.server_info.clone(),
                    instructions: self.instructions.clone(),
                })
            }
            Err(e) => {
                tracing::warn!("Initialize rejected: {e}");
                session.abort_initialize();
                Err(e)
            }
        }
    }

    fn validate(&self, params: Option<Value>) -> McpResult<InitializeParams> {
        let init: InitializeParams = params
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| McpError::InvalidParams(e.to_string()))?
            .ok_or_else(|| McpError::InvalidParams("Initialize params required".to_string()))?;

        if !self
            .supported_versions
            .iter()
            .any(|v| *v == init.protocol_version)
        {
            return Err(McpError::UnsupportedProtocolVersion {
                requested: init.protocol_version,
                supported: self.supported_versions.clone(),
            });
        }

        Ok(init)
    }
}
