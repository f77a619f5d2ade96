use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

mod api;
mod config;
mod docs;
mod sse;

use config::{AppState, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "mobilesms-mcp-server")]
#[command(about = "MCP server for MobileSMS.io over SSE and HTTP", long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(default_value = "6900")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Path to configuration file
    #[arg(short, long, default_value = "mobilesms.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mobilesms_server=info,tower_http=info".into()),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    let args = Args::parse();

    tracing::info!("Starting SMS MCP SSE Server");

    let config = ServerConfig::load(&args.config)?;
    tracing::info!("Upstream API: {}", config.upstream.base_url);

    let state = AppState::new(config)?;

    let addr = format!("{}:{}", args.host, args.port);
    api::serve(&addr, state).await?;

    Ok(())
}
