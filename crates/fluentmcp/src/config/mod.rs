//! Configuration loading and resolution.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::session::RunnerLimits;
use crate::types::{McpError, McpResult, SERVER_NAME, SERVER_VERSION, SUPPORTED_PROTOCOL_VERSIONS};

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "FLUENTMCP_CONFIG";

/// Config file picked up from the working directory when nothing else is given.
pub const LOCAL_CONFIG_FILE: &str = ".fluentmcp.json";

/// Which kinds advertise `listChanged`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListChangedConfig {
    pub tools: bool,
    pub prompts: bool,
    pub resources: bool,
}

/// Server settings. Every field has a default, so `{}` is a valid file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub name: String,
    pub version: String,
    pub instructions: Option<String>,
    /// Accepted `protocolVersion` values, newest first.
    pub protocol_versions: Vec<String>,
    /// Per-call handler timeout in milliseconds. 0 disables the timeout.
    pub handler_timeout_ms: u64,
    /// Spawn requests after initialization so they may complete out of order.
    pub concurrent: bool,
    pub list_changed: ListChangedConfig,
    /// Longest accepted input line, newline excluded. 0 disables the cap.
    pub max_message_bytes: usize,
    /// Messages queued for the writer before readers and handlers wait.
    pub outbound_queue: usize,
    /// Spawned requests allowed to run at once in concurrent mode.
    pub max_in_flight: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: SERVER_NAME.to_string(),
            version: SERVER_VERSION.to_string(),
            instructions: None,
            protocol_versions: SUPPORTED_PROTOCOL_VERSIONS
                .iter()
                .map(|v| v.to_string())
                .collect(),
            handler_timeout_ms: 60_000,
            concurrent: true,
            list_changed: ListChangedConfig::default(),
            max_message_bytes: 10 * 1024 * 1024,
            outbound_queue: 100,
            max_in_flight: 64,
        }
    }
}

impl ServerConfig {
    /// Load a config file.
    pub fn load(path: &Path) -> McpResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: ServerConfig = serde_json::from_str(&text).map_err(|e| {
            McpError::InvalidParams(format!("Invalid config {}: {e}", path.display()))
        })?;
        if config.protocol_versions.is_empty() {
            return Err(McpError::InvalidParams(format!(
                "Invalid config {}: protocol_versions must not be empty",
                path.display()
            )));
        }
        if config.outbound_queue == 0 || config.max_in_flight == 0 {
            return Err(McpError::InvalidParams(format!(
                "Invalid config {}: outbound_queue and max_in_flight must be positive",
                path.display()
            )));
        }
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load from the resolved path, or fall back to defaults.
    pub fn resolve(explicit: Option<&str>) -> McpResult<Self> {
        match resolve_config_path(explicit) {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn handler_timeout(&self) -> Option<Duration> {
        (self.handler_timeout_ms > 0).then(|| Duration::from_millis(self.handler_timeout_ms))
    }

    pub fn runner_limits(&self) -> RunnerLimits {
        RunnerLimits {
            max_message_bytes: (self.max_message_bytes > 0).then_some(self.max_message_bytes),
            outbound_queue: self.outbound_queue.max(1),
            max_in_flight: self.max_in_flight.max(1),
        }
    }
}

/// Resolve the config file path: explicit, then env, then the working
/// directory. `None` means built-in defaults.
pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
    let env_path = std::env::var(CONFIG_ENV).ok();
    resolve_in(explicit, env_path.as_deref(), Path::new("."))
}

fn resolve_in(explicit: Option<&str>, env_path: Option<&str>, cwd: &Path) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(PathBuf::from(path));
    }

    if let Some(env_path) = env_path.filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(env_path));
    }

    let local = cwd.join(LOCAL_CONFIG_FILE);
    if local.exists() {
        return Some(local);
    }

    None
}
