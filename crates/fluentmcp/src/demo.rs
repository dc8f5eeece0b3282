//! Demo registrations served by the `fluentmcp` binary.

use fluentmcp::types::{PromptArgument, PromptMessage};
use fluentmcp::{
    Arguments, McpServer, PromptArguments, PromptEntry, PromptOutput, ResourceEntry,
    ResourceOutput, ServerConfig, ToolEntry, ToolOutput,
};
use fluentmcp_schema::{ParamType, SchemaDescriptor, SchemaResult, ToolInput};
use serde::Deserialize;

const README: &str = "# fluentmcp demo\n\nTools: echo, add, fail.\nPrompts: greet, review.\n";

/// 1x1 transparent PNG.
const LOGO_PNG: &[u8] = &[
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1f,
    0x15, 0xc4, 0x89, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9c, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0d, 0x0a, 0x2d, 0xb4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
];

#[derive(Debug, Deserialize)]
struct AddInput {
    a: f64,
    b: f64,
}

impl ToolInput for AddInput {
    fn schema() -> SchemaResult<SchemaDescriptor> {
        SchemaDescriptor::builder()
            .required("a", ParamType::Number)
            .required("b", ParamType::Number)
            .describe("a", "First addend")
            .describe("b", "Second addend")
            .build()
    }
}

pub fn build_server(config: ServerConfig) -> anyhow::Result<McpServer> {
    let echo_schema = SchemaDescriptor::builder()
        .required("text", ParamType::String)
        .describe("text", "Text to echo back")
        .build()?;

    let server = McpServer::builder(config)
        .tool(
            ToolEntry::new("echo", echo_schema, |args: Arguments| async move {
                let text = args
                    .get("text")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string();
                Ok(ToolOutput::Text(text))
            })
            .with_description("Echo the given text"),
        )
        .typed_tool("add", "Add two numbers", |input: AddInput| async move {
            Ok(ToolOutput::text((input.a + input.b).to_string()))
        })
        .tool(
            ToolEntry::new("fail", SchemaDescriptor::empty(), |_| async {
                Err::<ToolOutput, _>(anyhow::anyhow!("this tool always fails"))
            })
            .with_description("Always returns a tool error"),
        )
        .prompt(
            PromptEntry::new("greet", |args: PromptArguments| async move {
                let name = args.get("name").map(String::as_str).unwrap_or("there");
                Ok(PromptOutput::text(format!("Say hello to {name}.")))
            })
            .with_description("Greet someone by name")
            .with_argument(PromptArgument::required("name").with_description("Who to greet")),
        )
        .prompt(
            PromptEntry::new("review", |args: PromptArguments| async move {
                let code = args.get("code").cloned().unwrap_or_default();
                Ok(PromptOutput::messages([
                    PromptMessage::user(format!("Review this code:\n\n{code}")),
                    PromptMessage::assistant("I'll look for bugs first, then style."),
                ]))
            })
            .with_description("Ask for a code review")
            .with_argument(PromptArgument::required("code"))
            .with_argument(PromptArgument::optional("language")),
        )
        .resource(
            ResourceEntry::new("demo://readme", "readme", || async {
                Ok(ResourceOutput::text(README))
            })
            .with_description("About this server")
            .with_mime_type("text/markdown"),
        )
        .resource(
            ResourceEntry::new("demo://logo", "logo", || async {
                Ok(ResourceOutput::Blob(LOGO_PNG.to_vec()))
            })
            .with_mime_type("image/png"),
        )
        .build()?;

    Ok(server)
}
