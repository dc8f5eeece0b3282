//! Stdio transport: reads JSON-RPC from stdin, writes to stdout.

use tokio::io::BufReader;

use crate::session::SessionRunner;
use crate::types::McpResult;

/// Stdio transport for desktop MCP clients.
#[derive(Debug)]
pub struct StdioTransport {
    runner: SessionRunner,
}

impl StdioTransport {
    pub fn new(runner: SessionRunner) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &SessionRunner {
        &self.runner
    }

    /// Run the session over the process's stdin and stdout.
    pub async fn run(self) -> McpResult<()> {
        tracing::info!("Stdio transport started");
        let reader = BufReader::new(tokio::io::stdin());
        self.runner.run(reader, tokio::io::stdout()).await
    }
}
