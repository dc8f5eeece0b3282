//! Request dispatcher: lifecycle gate, method routing, handler invocation.

use std::sync::Arc;
use std::time::Duration;

use fluentmcp_schema::validate_arguments;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::handler::PromptArguments;
use crate::registry::Registry;
use crate::session::{Session, SessionState};
use crate::types::notification;
use crate::types::*;

use super::invoke::{run_handler, InvokeError};
use super::negotiation::Negotiator;

/// Routes decoded messages for one session.
///
/// Cloning is cheap and every clone shares the same session, so requests
/// can be handed to spawned tasks.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
    negotiator: Arc<Negotiator>,
    session: Arc<Mutex<Session>>,
    handler_timeout: Option<Duration>,
}

impl Dispatcher {
    /// A dispatcher over a fresh, uninitialized session.
    pub fn new(
        registry: Arc<Registry>,
        negotiator: Arc<Negotiator>,
        handler_timeout: Option<Duration>,
    ) -> Self {
        Self {
            registry,
            negotiator,
            session: Arc::new(Mutex::new(Session::new())),
            handler_timeout,
        }
    }

    pub fn session(&self) -> &Arc<Mutex<Session>> {
        &self.session
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub async fn state(&self) -> SessionState {
        self.session.lock().await.state()
    }

    pub async fn is_ready(&self) -> bool {
        self.session.lock().await.is_ready()
    }

    /// Handle one inbound message. Requests always yield exactly one
    /// response; everything else yields none.
    pub async fn handle_message(&self, msg: JsonRpcMessage) -> Option<JsonRpcMessage> {
        match msg {
            JsonRpcMessage::Request(req) => Some(self.handle_request(req).await),
            JsonRpcMessage::Notification(notif) => {
                self.handle_notification(notif).await;
                None
            }
            JsonRpcMessage::Response(resp) => {
                tracing::warn!("Ignoring response from client (id {})", resp.id);
                None
            }
            JsonRpcMessage::Error(err) => {
                tracing::warn!(
                    "Ignoring error from client (id {}): {} {}",
                    err.id,
                    err.error.code,
                    err.error.message
                );
                None
            }
        }
    }

    pub async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcMessage {
        let id = request.id.clone();
        tracing::debug!("Request {} (id {})", request.method, id);

        let result = if request.method.trim().is_empty() {
            Err(McpError::InvalidRequest(
                "Method name must not be empty".to_string(),
            ))
        } else {
            self.dispatch_request(request).await
        };

        match result {
            Ok(value) => JsonRpcMessage::Response(JsonRpcResponse::new(id, value)),
            Err(e) => {
                tracing::warn!("Request id {id} failed: {e}");
                JsonRpcMessage::Error(e.to_json_rpc_error(id))
            }
        }
    }

    async fn dispatch_request(&self, request: JsonRpcRequest) -> McpResult<Value> {
        let JsonRpcRequest { method, params, .. } = request;

        if method == "initialize" {
            return self.handle_initialize(params).await;
        }

        if !self.session.lock().await.accepts_requests() {
            return Err(McpError::NotInitialized(method));
        }

        match method.as_str() {
            "ping" => Ok(Value::Object(serde_json::Map::new())),

            "tools/list" => self.handle_tools_list(),
            "tools/call" => self.handle_tools_call(params).await,

            "prompts/list" => self.handle_prompts_list(),
            "prompts/get" => self.handle_prompts_get(params).await,

            "resources/list" => self.handle_resources_list(),
            "resources/read" => self.handle_resources_read(params).await,

            _ => Err(McpError::MethodNotFound(method)),
        }
    }

    pub async fn handle_notification(&self, notif: JsonRpcNotification) {
        if !self.is_ready().await {
            tracing::debug!(
                "Dropping notification {} received before initialization",
                notif.method
            );
            return;
        }

        match notif.method.as_str() {
            notification::INITIALIZED => {
                tracing::info!("Client confirmed initialization");
            }
            notification::CANCELLED => {
                match notif
                    .params
                    .map(serde_json::from_value::<CancelledParams>)
                {
                    Some(Ok(params)) => tracing::info!(
                        "Client cancelled request {}: {}",
                        params.request_id,
                        params.reason.as_deref().unwrap_or("no reason given")
                    ),
                    _ => tracing::info!("Received cancellation notification"),
                }
            }
            other => {
                tracing::debug!("Unknown notification: {other}");
            }
        }
    }

    async fn handle_initialize(&self, params: Option<Value>) -> McpResult<Value> {
        let mut session = self.session.lock().await;
        let result = self.negotiator.negotiate(&mut session, params)?;
        to_result(result)
    }

    fn handle_tools_list(&self) -> McpResult<Value> {
        to_result(ToolListResult {
            tools: self.registry.list_tools(),
            next_cursor: None,
        })
    }

    async fn handle_tools_call(&self, params: Option<Value>) -> McpResult<Value> {
        let call: ToolCallParams = parse_params(params, "Tool call")?;
        let entry = self.registry.tool(&call.name)?;
        let args = validate_arguments(entry.schema(), call.arguments)
            .map_err(|e| McpError::InvalidParams(e.to_string()))?;

        let result = match run_handler(entry.invoke(args), self.handler_timeout).await {
            Ok(output) => output.into_call_result(),
            Err(e) => {
                tracing::warn!("Tool '{}' failed: {e}", call.name);
                CallToolResult::error(e.to_string())
            }
        };
        to_result(result)
    }

    fn handle_prompts_list(&self) -> McpResult<Value> {
        to_result(PromptListResult {
            prompts: self.registry.list_prompts(),
            next_cursor: None,
        })
    }

    async fn handle_prompts_get(&self, params: Option<Value>) -> McpResult<Value> {
        let get: PromptGetParams = parse_params(params, "Prompt get")?;
        let entry = self.registry.prompt(&get.name)?;
        let args = prompt_arguments(get.arguments)?;

        let missing = entry.missing_arguments(&args);
        if !missing.is_empty() {
            return Err(McpError::InvalidParams(format!(
                "Missing required argument(s): {}",
                missing.join(", ")
            )));
        }

        let output = run_handler(entry.invoke(args), self.handler_timeout)
            .await
            .map_err(|e| handler_failure(format!("prompt '{}'", get.name), e))?;
        output.into_result(entry.name(), entry.description())
    }

    fn handle_resources_list(&self) -> McpResult<Value> {
        to_result(ResourceListResult {
            resources: self.registry.list_resources(),
            next_cursor: None,
        })
    }

    async fn handle_resources_read(&self, params: Option<Value>) -> McpResult<Value> {
        let read: ResourceReadParams = parse_params(params, "Resource read")?;
        let entry = self.registry.resource(&read.uri)?;

        let output = run_handler(entry.invoke(), self.handler_timeout)
            .await
            .map_err(|e| handler_failure(format!("resource '{}'", read.uri), e))?;
        output.into_result(entry.uri(), entry.mime_type())
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("handler_timeout", &self.handler_timeout)
            .finish_non_exhaustive()
    }
}

fn parse_params<T: DeserializeOwned>(params: Option<Value>, what: &str) -> McpResult<T> {
    params
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| McpError::InvalidParams(e.to_string()))?
        .ok_or_else(|| McpError::InvalidParams(format!("{what} params required")))
}

fn to_result<T: serde::Serialize>(result: T) -> McpResult<Value> {
    serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
}

/// Prompt arguments are strings on the wire. Other JSON values are
/// stringified; `null` counts as absent.
fn prompt_arguments(arguments: Option<Value>) -> McpResult<PromptArguments> {
    let map = match arguments {
        None | Some(Value::Null) => return Ok(PromptArguments::new()),
        Some(Value::Object(map)) => map,
        Some(_) => {
            return Err(McpError::InvalidParams(
                "Prompt arguments must be an object".to_string(),
            ))
        }
    };

    Ok(map
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::Null => None,
            Value::String(s) => Some((key, s)),
            other => Some((key, other.to_string())),
        })
        .collect())
}

fn handler_failure(target: String, error: InvokeError) -> McpError {
    tracing::warn!("Handler for {target} failed: {error}");
    match error {
        InvokeError::TimedOut(after) => McpError::HandlerTimeout { target, after },
        other => McpError::InternalError(format!("{target}: {other}")),
    }
}
