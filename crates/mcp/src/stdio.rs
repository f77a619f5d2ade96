// Newline-delimited JSON-RPC transport over stdin/stdout

use crate::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use crate::server::McpServer;
use anyhow::{Context, Result};
use futures::StreamExt;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::{FramedRead, LinesCodec};

/// Lifecycle of the single stdio connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Uninitialized,
    Connected,
    Terminated,
}

/// Serve MCP on the process's stdin/stdout until stdin closes
pub async fn serve_stdio(server: &McpServer) -> Result<ConnectionState> {
    serve(server, tokio::io::stdin(), tokio::io::stdout()).await
}

/// Serve MCP over any line-oriented byte stream.
///
/// Requests are handled one at a time, in the order they arrive.
pub async fn serve<R, W>(server: &McpServer, reader: R, mut writer: W) -> Result<ConnectionState>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = FramedRead::new(reader, LinesCodec::new());
    let mut state = ConnectionState::Uninitialized;

    while let Some(line) = lines.next().await {
        let line = line.context("Failed to read from input stream")?;
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<JsonRpcRequest>(&line) {
            Ok(request) => {
                if request.method == "initialize" && state == ConnectionState::Uninitialized {
                    state = ConnectionState::Connected;
                    tracing::info!("MCP client connected over stdio");
                }
                server.handle_request(request).await
            }
            Err(e) => {
                tracing::warn!("Rejecting malformed message: {}", e);
                Some(malformed_response(&line))
            }
        };

        if let Some(response) = response {
            let mut payload =
                serde_json::to_string(&response).context("Failed to serialize response")?;
            payload.push('\n');
            writer
                .write_all(payload.as_bytes())
                .await
                .context("Failed to write response")?;
            writer.flush().await.context("Failed to flush output")?;
        }
    }

    tracing::info!("Input stream closed, terminating MCP session");
    state = ConnectionState::Terminated;
    Ok(state)
}

// Valid JSON that is not a request is an invalid request; anything else is a parse error
fn malformed_response(line: &str) -> JsonRpcResponse {
    match serde_json::from_str::<Value>(line) {
        Ok(value) => {
            let id = value.get("id").cloned().unwrap_or(Value::Null);
            JsonRpcResponse::error(id, JsonRpcError::invalid_request())
        }
        Err(_) => JsonRpcResponse::error(Value::Null, JsonRpcError::parse_error()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::sms_catalog;
    use mobilesms_core::{UpstreamClient, UpstreamConfig};
    use serde_json::json;
    use std::sync::Arc;
    use tokio::io::AsyncReadExt;

    fn test_server() -> McpServer {
        let config = UpstreamConfig::parse("https://example.com/api.php", "k").unwrap();
        McpServer::new(
            Arc::new(sms_catalog()),
            UpstreamClient::new(config).unwrap(),
        )
    }

    async fn run_session(input: &str) -> (ConnectionState, Vec<Value>) {
        let server = test_server();
        let (mut output_tx, mut output_rx) = tokio::io::duplex(64 * 1024);

        let state = serve(&server, input.as_bytes(), &mut output_tx)
            .await
            .unwrap();
        drop(output_tx);

        let mut output = String::new();
        output_rx.read_to_string(&mut output).await.unwrap();

        let responses = output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        (state, responses)
    }

    #[tokio::test]
    async fn test_handshake_then_list() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05","capabilities":{},"clientInfo":{"name":"test","version":"0"}}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            "\n",
        );

        let (state, responses) = run_session(input).await;

        assert_eq!(state, ConnectionState::Terminated);
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["id"], json!(1));
        assert_eq!(responses[0]["result"]["serverInfo"]["name"], "mobilesms_mcp");
        assert_eq!(responses[1]["id"], json!(2));
        assert_eq!(responses[1]["result"]["tools"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_garbage_line_gets_parse_error() {
        let input = "this is not json\n\n{\"id\":9}\n";

        let (_, responses) = run_session(input).await;

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["error"]["code"], json!(-32700));
        assert_eq!(responses[0]["id"], Value::Null);
        assert_eq!(responses[1]["error"]["code"], json!(-32600));
        assert_eq!(responses[1]["id"], json!(9));
    }

    #[tokio::test]
    async fn test_empty_input_terminates() {
        let (state, responses) = run_session("").await;

        assert_eq!(state, ConnectionState::Terminated);
        assert!(responses.is_empty());
    }
}
