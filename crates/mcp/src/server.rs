// MCP server: one protocol-server instance bound to one upstream API key

use crate::error::McpError;
use crate::protocol::{
    CallToolParams, InitializeResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse,
    ListToolsResult, ServerCapabilities, ServerInfo, ToolsCapability, JSONRPC_VERSION,
    PROTOCOL_VERSION,
};
use crate::tools::ToolRegistry;
use mobilesms_core::UpstreamClient;
use serde_json::{json, Value};
use std::sync::Arc;

/// Handles MCP requests for a single caller.
///
/// The tool catalog is shared; the upstream client (and with it the API key)
/// belongs to this instance only.
#[derive(Clone)]
pub struct McpServer {
    registry: Arc<ToolRegistry>,
    client: UpstreamClient,
    info: ServerInfo,
}

impl McpServer {
    pub fn new(registry: Arc<ToolRegistry>, client: UpstreamClient) -> Self {
        Self {
            registry,
            client,
            info: ServerInfo::default(),
        }
    }

    /// Handle one JSON-RPC message. Returns `None` for notifications.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let id = request.id.clone().unwrap_or(Value::Null);

        // Notifications never get a response, not even an error
        if request.is_notification() {
            tracing::debug!("Notification received: {}", request.method);
            return None;
        }

        if request.jsonrpc != JSONRPC_VERSION {
            return Some(JsonRpcResponse::error(id, JsonRpcError::invalid_request()));
        }

        let outcome = match request.method.as_str() {
            "initialize" => Ok(self.initialize()),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(self.list_tools()),
            "tools/call" => self.call_tool(request.params).await,
            other => {
                tracing::debug!("Unsupported method: {}", other);
                return Some(JsonRpcResponse::error(
                    id,
                    JsonRpcError::method_not_found(other),
                ));
            }
        };

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(err) => JsonRpcResponse::error(id, err.into()),
        })
    }

    fn initialize(&self) -> Value {
        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: false,
                }),
            },
            server_info: self.info.clone(),
        };
        serde_json::to_value(result).unwrap_or(Value::Null)
    }

    /// The catalog as an MCP `tools/list` result
    pub fn list_tools(&self) -> Value {
        let result = ListToolsResult {
            tools: self.registry.list_schemas(),
        };
        serde_json::to_value(result).unwrap_or(Value::Null)
    }

    /// Run `tools/call` with raw params
    pub async fn call_tool(&self, params: Option<Value>) -> Result<Value, McpError> {
        let params: CallToolParams = serde_json::from_value(params.unwrap_or(Value::Null))
            .map_err(|e| McpError::InvalidParams(format!("Invalid tools/call params: {}", e)))?;

        tracing::info!("Tool call: {}", params.name);

        let result = self.registry.dispatch(&self.client, params).await?;
        serde_json::to_value(result).map_err(|e| McpError::Internal(e.to_string()))
    }
}
