//! fluentmcp-schema — registration-time input schemas for MCP tools.

pub mod descriptor;
pub mod types;
pub mod validate;

pub use descriptor::{SchemaBuilder, SchemaDescriptor, ToolInput};
pub use types::*;
pub use validate::{coerce_value, validate_arguments};
