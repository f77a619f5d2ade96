// Standalone MCP server binary (stdio transport, single API key)

use anyhow::{Context, Result};
use clap::Parser;
use mobilesms_core::config::resolve_base_url;
use mobilesms_core::{redact_api_key, UpstreamClient, UpstreamConfig};
use mobilesms_mcp::server::McpServer;
use mobilesms_mcp::stdio::serve_stdio;
use mobilesms_mcp::tools::sms_catalog;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "mobilesms-mcp")]
#[command(about = "MobileSMS.io MCP server over stdio", long_about = None)]
struct Args {
    /// MobileSMS.io API key
    #[arg(short = 'k', long, env = "SMS_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Upstream API endpoint
    #[arg(long, env = "SMS_API_BASE_URL")]
    base_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the protocol, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args = Args::parse();

    let api_key = args.api_key.unwrap_or_default();
    if api_key.is_empty() {
        tracing::warn!(
            "No API key provided. Set SMS_API_KEY environment variable or pass --api-key argument."
        );
    }

    let base_url = resolve_base_url(args.base_url.as_deref());
    let config = UpstreamConfig::parse(&base_url, api_key)
        .with_context(|| format!("Invalid upstream base URL: {}", base_url))?;

    tracing::info!(
        "Using upstream {} with API key {}",
        config.base_url,
        redact_api_key(&config.api_key)
    );

    let client = UpstreamClient::new(config).context("Failed to create upstream client")?;
    let server = McpServer::new(Arc::new(sms_catalog()), client);

    tracing::info!("SMS MCP server running on stdio");
    let state = serve_stdio(&server).await?;
    tracing::info!("MCP session ended ({:?})", state);

    Ok(())
}
