// Core upstream access for the MobileSMS MCP adapter

pub mod client;
pub mod config;
pub mod error;

pub use client::{ActionParams, UpstreamClient, UpstreamPayload};
pub use config::{redact_api_key, UpstreamConfig};
pub use error::{UpstreamError, UpstreamResult};
