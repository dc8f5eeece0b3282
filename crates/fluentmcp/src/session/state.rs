//! Per-connection session state and lifecycle.

use crate::types::{ClientCapabilities, Implementation, ServerCapabilities};

/// Lifecycle of a single connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Initializing,
    Ready,
    ShuttingDown,
    Closed,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::Initializing => "initializing",
            SessionState::Ready => "ready",
            SessionState::ShuttingDown => "shutting-down",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Negotiated state of one MCP connection.
#[derive(Debug, Clone)]
pub struct Session {
    state: SessionState,
    protocol_version: Option<String>,
    client_info: Option<Implementation>,
    client_capabilities: ClientCapabilities,
    server_capabilities: ServerCapabilities,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: SessionState::Uninitialized,
            protocol_version: None,
            client_info: None,
            client_capabilities: ClientCapabilities::default(),
            server_capabilities: ServerCapabilities::default(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == SessionState::Ready
    }

    /// Requests are served once Ready, and still while in-flight work drains.
    pub fn accepts_requests(&self) -> bool {
        matches!(self.state, SessionState::Ready | SessionState::ShuttingDown)
    }

    /// Protocol version agreed during `initialize`.
    pub fn protocol_version(&self) -> Option<&str> {
        self.protocol_version.as_deref()
    }

    pub fn client_info(&self) -> Option<&Implementation> {
        self.client_info.as_ref()
    }

    pub fn client_capabilities(&self) -> &ClientCapabilities {
        &self.client_capabilities
    }

    pub fn server_capabilities(&self) -> &ServerCapabilities {
        &self.server_capabilities
    }

    pub(crate) fn begin_initialize(&mut self) {
        self.transition(SessionState::Initializing);
    }

    pub(crate) fn complete_initialize(
        &mut self,
        protocol_version: String,
        client_info: Implementation,
        client_capabilities: ClientCapabilities,
        server_capabilities: ServerCapabilities,
    ) {
        self.protocol_version = Some(protocol_version);
        self.client_info = Some(client_info);
        self.client_capabilities = client_capabilities;
        self.server_capabilities = server_capabilities;
        self.transition(SessionState::Ready);
    }

    /// Failed handshake: the client may retry `initialize`.
    pub(crate) fn abort_initialize(&mut self) {
        self.transition(SessionState::Uninitialized);
    }

    pub(crate) fn begin_shutdown(&mut self) {
        if self.state != SessionState::Closed {
            self.transition(SessionState::ShuttingDown);
        }
    }

    pub(crate) fn close(&mut self) {
        self.transition(SessionState::Closed);
    }

    fn transition(&mut self, next: SessionState) {
        if self.state != next {
            tracing::debug!("Session state {} -> {}", self.state, next);
            self.state = next;
        }
    }
}
