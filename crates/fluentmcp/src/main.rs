//! fluentmcp server: entry point.

mod demo;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use fluentmcp::ServerConfig;

#[derive(Parser)]
#[command(
    name = "fluentmcp",
    about = "MCP server core with fluent tool, prompt, and resource registration",
    version
)]
struct Cli {
    /// Path to a JSON config file.
    /// Also reads FLUENTMCP_CONFIG, then ./.fluentmcp.json.
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error). RUST_LOG takes precedence.
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP server over stdio (default).
    Serve,

    /// Print server info, capabilities, and registrations as JSON.
    Info,

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   fluentmcp completions bash > ~/.local/share/bash-completion/completions/fluentmcp
    ///   fluentmcp completions zsh > ~/.zfunc/_fluentmcp
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let config = ServerConfig::resolve(cli.config.as_deref())?;
            let server = demo::build_server(config)?;
            server.serve_stdio().await?;
        }

        Commands::Info => {
            let config = ServerConfig::resolve(cli.config.as_deref())?;
            let server = demo::build_server(config)?;
            let registry = server.registry();
            let info = serde_json::json!({
                "server": server.server_info(),
                "protocol_versions": server.config().protocol_versions,
                "capabilities": server.capabilities(),
                "tools": registry.tools().iter().map(|t| t.name()).collect::<Vec<_>>(),
                "prompts": registry.prompts().iter().map(|p| p.name()).collect::<Vec<_>>(),
                "resources": registry.resources().iter().map(|r| r.uri()).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "fluentmcp", &mut std::io::stdout());
        }
    }

    Ok(())
}
