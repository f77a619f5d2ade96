// Stateless JSON-RPC over HTTP: every request carries its own API key

use super::ApiError;
use crate::config::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use mobilesms_core::redact_api_key;
use mobilesms_mcp::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use mobilesms_mcp::McpError;
use serde_json::Value;
use std::sync::Arc;

pub const API_KEY_HEADER: &str = "x-api-key";

/// `POST /mcp`
pub async fn handle_rpc(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    // Credentials are checked before anything else
    let Some(api_key) = headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|key| !key.is_empty())
    else {
        return ApiError::bad_request("MobileSMS.io API key required. Use X-API-Key header")
            .into_response();
    };

    let Some(request) = payload.ok().and_then(|Json(message)| parse_envelope(message)) else {
        return ApiError::bad_request("Invalid JSON-RPC message. Required: jsonrpc, method, id")
            .into_response();
    };

    tracing::info!(
        "HTTP MCP call: {} with API key: {}",
        request.method,
        redact_api_key(api_key)
    );

    let id = request.id.clone().unwrap_or(Value::Null);

    match request.method.as_str() {
        "tools/list" => {
            let server = match state.mcp_server_for(api_key) {
                Ok(server) => server,
                Err(e) => return ApiError::from(e).into_response(),
            };
            Json(JsonRpcResponse::success(id, server.list_tools())).into_response()
        }
        "tools/call" => match call_tool(&state, api_key, request.params).await {
            Ok(result) => Json(JsonRpcResponse::success(id, result)).into_response(),
            Err(err) => {
                tracing::error!("Error handling MCP call: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(JsonRpcResponse::error(id, err.into())),
                )
                    .into_response()
            }
        },
        other => Json(JsonRpcResponse::error(id, JsonRpcError::method_not_found(other)))
            .into_response(),
    }
}

// Requires an object with a truthy `jsonrpc` and a string `method`
fn parse_envelope(message: Value) -> Option<JsonRpcRequest> {
    let object = message.as_object()?;
    match object.get("jsonrpc") {
        None | Some(Value::Null) | Some(Value::Bool(false)) => return None,
        Some(Value::String(version)) if version.is_empty() => return None,
        _ => {}
    }
    if !object.get("method").is_some_and(Value::is_string) {
        return None;
    }
    serde_json::from_value(message).ok()
}

async fn call_tool(
    state: &AppState,
    api_key: &str,
    params: Option<Value>,
) -> Result<Value, McpError> {
    // Fresh per-request configuration, never shared between callers
    let server = state
        .mcp_server_for(api_key)
        .map_err(|e| McpError::Internal(e.to_string()))?;

    server.call_tool(params).await
}
