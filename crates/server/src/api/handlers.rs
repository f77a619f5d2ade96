use crate::config::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use serde_json::{json, Map, Value};
use std::sync::Arc;

const SERVER_NAME: &str = "SMS MCP SSE Server";

/// Liveness probe
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "server": SERVER_NAME,
    }))
}

/// Endpoint map and usage notes
pub async fn api_info() -> impl IntoResponse {
    Json(json!({
        "name": SERVER_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "transport": "SSE + HTTP",
        "endpoints": {
            "sse": "/sse",
            "messages": "/messages",
            "http": "/mcp",
            "health": "/health",
            "docs": "/docs",
            "tools": "/tools",
            "setup": "/setup/guide",
            "config": "/setup/claude-code-config"
        },
        "usage": {
            "sse": "Connect to /sse?apiKey=your-mobilesms-api-key",
            "messages": "Client POSTs to /messages?sessionId=<id> after SSE connection",
            "http": "POST to /mcp with JSON-RPC messages and X-API-Key header (MobileSMS.io API key)",
            "docs": "Visit /docs for API documentation"
        }
    }))
}

/// The tool catalog in a human-oriented form, derived from the MCP schemas
pub async fn list_tools(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let tools: Vec<Value> = state
        .registry
        .tools()
        .map(|tool| {
            let schema = tool.schema();
            json!({
                "name": schema.name,
                "description": schema.description,
                "parameters": describe_parameters(&schema.input_schema),
                "example": tool.example(),
            })
        })
        .collect();

    Json(json!({ "tools": tools }))
}

// Flatten a JSON schema into {param: {type, description, required}}
fn describe_parameters(input_schema: &Value) -> Value {
    let required: Vec<&str> = input_schema
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let mut parameters = Map::new();
    if let Some(properties) = input_schema.get("properties").and_then(Value::as_object) {
        for (name, property) in properties {
            parameters.insert(
                name.clone(),
                json!({
                    "type": property.get("type").cloned().unwrap_or(Value::Null),
                    "description": property.get("description").cloned().unwrap_or(Value::Null),
                    "required": required.contains(&name.as_str()),
                }),
            );
        }
    }
    Value::Object(parameters)
}

fn claude_command(public_url: &str) -> String {
    format!(
        "claude mcp add -t sse mobilesms-server \"{}/sse?apiKey=YOUR_MOBILESMS_API_KEY\"",
        public_url.trim_end_matches('/')
    )
}

fn setup_steps() -> Value {
    json!([
        "1. Get your SMS API key from your MobileSMS.io account",
        "2. Open your terminal",
        "3. Run the command above, replacing YOUR_MOBILESMS_API_KEY with your actual MobileSMS.io API key",
        "4. The SMS tools will now be available in your Claude Code sessions"
    ])
}

const SETUP_NOTE: &str =
    "Make sure you have Claude Code CLI installed and configured before running this command";

/// Setup instructions for the Claude Code CLI and direct HTTP use
pub async fn setup_guide(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let base_url = state.config.public_url.trim_end_matches('/');

    Json(json!({
        "claude_code": {
            "description": "To use this MCP server with Claude Code CLI, run the following command in your terminal",
            "command": claude_command(base_url),
            "steps": setup_steps(),
            "note": SETUP_NOTE
        },
        "direct_api": {
            "description": "Use the HTTP endpoint for direct API integration",
            "endpoints": {
                "base_url": base_url,
                "mcp_endpoint": "/mcp",
                "sse_endpoint": "/sse"
            },
            "authentication": {
                "http": "Use X-API-Key header with YOUR_MOBILESMS_API_KEY",
                "sse": "Pass apiKey as query parameter: /sse?apiKey=YOUR_MOBILESMS_API_KEY"
            },
            "examples": {
                "curl_example": format!(
                    "curl -X POST {}/mcp -H \"Content-Type: application/json\" -H \"X-API-Key: YOUR_MOBILESMS_API_KEY\" -d '{{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"tools/call\",\"params\":{{\"name\":\"get_balance\",\"arguments\":{{}}}}}}'",
                    base_url
                ),
                "javascript_example": format!(
                    "fetch(\"{}/mcp\", {{ method: \"POST\", headers: {{ \"Content-Type\": \"application/json\", \"X-API-Key\": \"YOUR_MOBILESMS_API_KEY\" }}, body: JSON.stringify({{ jsonrpc: \"2.0\", id: 1, method: \"tools/call\", params: {{ name: \"get_balance\", arguments: {{}} }} }}) }})",
                    base_url
                )
            }
        }
    }))
}

/// Just the Claude Code CLI command
pub async fn claude_code_config(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "command": claude_command(&state.config.public_url),
        "description": "Run this command in your terminal to add the MobileSMS MCP server to Claude Code CLI",
        "steps": setup_steps(),
        "note": SETUP_NOTE
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::create_router;
    use crate::config::ServerConfig;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use std::path::PathBuf;
    use tower::ServiceExt;

    fn test_app() -> axum::Router {
        let mut config = ServerConfig::default();
        config.public_url = "https://sms.example.com/".to_string();
        config.docs.spec_path = PathBuf::from("/nonexistent/swagger.json");
        create_router(Arc::new(AppState::new(config).unwrap()))
    }

    async fn get_json(uri: &str) -> (StatusCode, Value) {
        let response = test_app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json("/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_tools_endpoint() {
        let (status, body) = get_json("/tools").await;

        assert_eq!(status, StatusCode::OK);
        let tools = body["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 4);
        assert_eq!(tools[0]["name"], "generate_number");
        assert_eq!(tools[0]["parameters"]["service"]["required"], true);
        assert_eq!(tools[0]["parameters"]["zipcode"]["required"], false);
        assert_eq!(tools[2]["parameters"], json!({}));
        assert_eq!(tools[1]["example"]["number"], "5551234567");
    }

    #[tokio::test]
    async fn test_setup_uses_public_url() {
        let (_, guide) = get_json("/setup/guide").await;
        assert_eq!(
            guide["claude_code"]["command"],
            "claude mcp add -t sse mobilesms-server \"https://sms.example.com/sse?apiKey=YOUR_MOBILESMS_API_KEY\""
        );
        assert_eq!(guide["direct_api"]["endpoints"]["base_url"], "https://sms.example.com");
        assert_eq!(
            guide["direct_api"]["examples"]["javascript_example"],
            "fetch(\"https://sms.example.com/mcp\", { method: \"POST\", headers: { \"Content-Type\": \"application/json\", \"X-API-Key\": \"YOUR_MOBILESMS_API_KEY\" }, body: JSON.stringify({ jsonrpc: \"2.0\", id: 1, method: \"tools/call\", params: { name: \"get_balance\", arguments: {} } }) })"
        );
        assert!(guide["direct_api"]["examples"]["curl_example"]
            .as_str()
            .unwrap()
            .starts_with("curl -X POST https://sms.example.com/mcp "));

        let (status, config) = get_json("/setup/claude-code-config").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(config["command"], guide["claude_code"]["command"]);
    }

    #[tokio::test]
    async fn test_api_info() {
        let (_, info) = get_json("/api/info").await;
        assert_eq!(info["endpoints"]["http"], "/mcp");
        assert_eq!(info["transport"], "SSE + HTTP");
    }
}
