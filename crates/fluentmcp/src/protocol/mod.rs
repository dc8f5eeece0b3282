//! MCP protocol handling: negotiation and dispatch.

pub mod dispatcher;
pub mod invoke;
pub mod negotiation;

pub use dispatcher::Dispatcher;
pub use invoke::{run_handler, InvokeError};
pub use negotiation::{server_capabilities, Negotiator};
