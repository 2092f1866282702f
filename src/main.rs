mod atlas;
mod cli;
mod config;
mod db;
mod error;
mod hash;
mod server;
mod store;
mod tools;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "waymark", version, about = "Knowledge-persistence MCP server for AI coding assistants")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the MCP server (stdio or SSE per config)
    Serve,
    /// Delete facts whose TTL has elapsed
    Expire,
    /// Show store statistics
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config (for log level)
    let config = config::WaymarkConfig::load()?;

    // Initialize tracing with the configured log level.
    // Log to stderr so stdout stays clean for MCP JSON-RPC.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve => match config.server.transport.as_str() {
            "sse" => server::serve_sse(config).await?,
            _ => server::serve_stdio(config).await?,
        },
        Command::Expire => cli::expire(&config)?,
        Command::Stats => cli::stats(&config)?,
    }

    Ok(())
}
