//! fluentmcp: an MCP server core with fluent registration of tools,
//! prompts, and resources over newline-delimited JSON-RPC.

pub mod codec;
pub mod config;
pub mod handler;
pub mod prompts;
pub mod protocol;
pub mod registry;
pub mod resources;
pub mod server;
pub mod session;
pub mod tools;
pub mod transport;
pub mod types;

pub use config::ServerConfig;
pub use handler::{Arguments, HandlerResult, PromptArguments};
pub use prompts::{PromptEntry, PromptOutput};
pub use protocol::Dispatcher;
pub use registry::{EntryKind, Registry};
pub use resources::{ResourceEntry, ResourceOutput};
pub use server::{McpServer, ServerBuilder};
pub use session::{Notifier, RunnerLimits, SessionRunner, SessionState};
pub use tools::{ToolEntry, ToolOutput};
pub use transport::StdioTransport;
