// MCP (Model Context Protocol) server for the MobileSMS tools
// Exposes the SMS tools to agent clients over stdio or through the HTTP adapter

pub mod error;
pub mod protocol;
pub mod server;
pub mod stdio;
pub mod tools;

pub use error::{McpError, McpResult};
pub use server::McpServer;
