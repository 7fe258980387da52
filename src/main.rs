//! gmail-mcp-rs: Gmail MCP server over stdio
//!
//! Exposes two tools to an MCP host: the identity of the connected Google
//! account and a bounded Gmail message search. Credentials are read from a
//! file written by an external OAuth authorization step.
//!
//! # Architecture
//!
//! - [`main`]: Process entry point with env loading, CLI flags, stdio serving
//! - [`config`]: Environment-driven configuration for account and endpoints
//! - [`errors`]: Application error model with MCP error mapping
//! - [`credentials`]: Stored OAuth credential lookup
//! - [`gmail`]: Gmail REST and userinfo client behind the `MailProvider` trait
//! - [`models`]: Tool contract DTOs, schema-bearing inputs, provider records
//! - [`tools`]: `ToolHandler` contract, registry, and the two tools
//! - [`server`]: rmcp `ServerHandler` dispatching through the registry

mod config;
mod credentials;
mod errors;
mod gmail;
mod models;
mod server;
mod tools;

use std::path::PathBuf;

use clap::Parser;
use config::ServerConfig;
use rmcp::ServiceExt;
use rmcp::transport::stdio;
use tracing_subscriber::EnvFilter;

/// Command-line flags; each overrides its environment variable
#[derive(Debug, Parser)]
#[command(version, about = "Gmail MCP server over stdio")]
struct Cli {
    /// Account whose stored credentials are used
    #[arg(long)]
    user_id: Option<String>,
    /// Directory holding `.oauth2.<user_id>.json` credential files
    #[arg(long)]
    credentials_dir: Option<PathBuf>,
}

/// Application entry point
///
/// Initializes tracing from environment, loads config, and serves the MCP
/// server over stdio. Logs go to stderr; stdout carries the protocol.
///
/// # Example
///
/// ```no_run
/// GMAIL_MCP_USER_ID=user@gmail.com \
/// GMAIL_MCP_CREDENTIALS_DIR=$HOME/.config/gmail-mcp \
/// cargo run
/// ```
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut config = ServerConfig::load_from_env(cli.user_id)?;
    if let Some(dir) = cli.credentials_dir {
        config.credentials_dir = dir;
    }

    let service = server::GmailMcpServer::from_config(&config)?
        .serve(stdio())
        .await?;
    service.waiting().await?;
    Ok(())
}
