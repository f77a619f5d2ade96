//! SSE transport: one MCP session per `GET /sse` connection.
//!
//! Each connection gets a fresh session id, a protocol-server instance bound
//! to the caller's API key, and a worker that processes that session's
//! messages in arrival order. The session entry lives exactly as long as the
//! SSE stream: a guard owned by the stream removes it when the stream is
//! dropped (client disconnect) or finishes (server-side close).

use crate::api::{ApiError, ApiResult};
use crate::config::AppState;
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
};
use futures::Stream;
use mobilesms_core::redact_api_key;
use mobilesms_mcp::protocol::{JsonRpcRequest, JsonRpcResponse};
use mobilesms_mcp::McpServer;
use serde::Deserialize;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Path clients POST their messages to
pub const MESSAGES_PATH: &str = "/messages";

/// Responses buffered per session before the worker waits on the client
const OUTBOUND_BUFFER: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session {0} is already registered")]
    Duplicate(String),

    #[error("Session {0} is closed")]
    Closed(String),
}

/// Server side of one SSE connection
#[derive(Debug, Clone)]
pub struct SseTransport {
    session_id: String,
    outbound: mpsc::Sender<String>,
    closed: CancellationToken,
}

impl SseTransport {
    /// Create a transport with a fresh session id, plus the receiving end of its event queue
    pub fn new() -> (Self, mpsc::Receiver<String>) {
        let (outbound, rx) = mpsc::channel(OUTBOUND_BUFFER);
        let transport = Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            outbound,
            closed: CancellationToken::new(),
        };
        (transport, rx)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// URL the client must POST messages to
    pub fn endpoint(&self) -> String {
        format!("{}?sessionId={}", MESSAGES_PATH, self.session_id)
    }

    /// Queue a JSON-RPC response as a `message` event
    pub async fn send(&self, response: &JsonRpcResponse) -> Result<(), SessionError> {
        if self.is_closed() {
            return Err(SessionError::Closed(self.session_id.clone()));
        }
        let payload = serde_json::to_string(response)
            .map_err(|_| SessionError::Closed(self.session_id.clone()))?;
        self.outbound
            .send(payload)
            .await
            .map_err(|_| SessionError::Closed(self.session_id.clone()))
    }

    /// End the SSE stream. Safe to call more than once.
    pub fn close(&self) {
        self.closed.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }
}

/// A registered session: transport, protocol server, and the worker's inbox
pub struct SessionHandle {
    transport: SseTransport,
    server: McpServer,
    inbound: mpsc::UnboundedSender<JsonRpcRequest>,
}

impl SessionHandle {
    pub fn session_id(&self) -> &str {
        self.transport.session_id()
    }

    pub fn transport(&self) -> &SseTransport {
        &self.transport
    }

    pub fn server(&self) -> &McpServer {
        &self.server
    }

    /// Hand one message to the session worker
    pub fn deliver(&self, request: JsonRpcRequest) -> Result<(), SessionError> {
        self.inbound
            .send(request)
            .map_err(|_| SessionError::Closed(self.session_id().to_string()))
    }
}

/// Live sessions keyed by session id
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<Mutex<HashMap<String, Arc<SessionHandle>>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<SessionHandle>>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a session. An id that is still live is never reused.
    pub fn register(&self, handle: Arc<SessionHandle>) -> Result<(), SessionError> {
        let mut sessions = self.lock();
        let id = handle.session_id().to_string();
        if sessions.contains_key(&id) {
            return Err(SessionError::Duplicate(id));
        }
        sessions.insert(id, handle);
        Ok(())
    }

    pub fn get(&self, session_id: &str) -> Option<Arc<SessionHandle>> {
        self.lock().get(session_id).cloned()
    }

    /// Remove a session and close its transport
    pub fn remove(&self, session_id: &str) -> Option<Arc<SessionHandle>> {
        let removed = self.lock().remove(session_id);
        if let Some(handle) = &removed {
            handle.transport.close();
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Close every open session. Returns how many were closed.
    pub fn close_all(&self) -> usize {
        let drained: Vec<_> = self.lock().drain().collect();
        for (session_id, handle) in &drained {
            tracing::info!("Closing transport for session {}", session_id);
            handle.transport.close();
        }
        drained.len()
    }
}

/// Removes the session when the SSE stream goes away
struct SessionGuard {
    session_id: String,
    registry: SessionRegistry,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if self.registry.remove(&self.session_id).is_some() {
            tracing::info!("SSE transport closed for session {}", self.session_id);
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SseQuery {
    #[serde(rename = "apiKey")]
    pub api_key: Option<String>,
}

/// `GET /sse?apiKey=...`
pub async fn sse_connect(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SseQuery>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let api_key = query
        .api_key
        .filter(|key| !key.is_empty())
        .ok_or_else(|| ApiError::bad_request("API key required. Use: /sse?apiKey=your-api-key"))?;

    tracing::info!(
        "New MCP SSE connection with API key: {}",
        redact_api_key(&api_key)
    );

    let server = state.mcp_server_for(&api_key)?;
    let (transport, outbound_rx) = SseTransport::new();
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let session_id = transport.session_id().to_string();

    let handle = Arc::new(SessionHandle {
        transport: transport.clone(),
        server,
        inbound: inbound_tx,
    });
    state.sessions.register(handle.clone())?;

    let guard = SessionGuard {
        session_id: session_id.clone(),
        registry: state.sessions.clone(),
    };

    tokio::spawn(run_session(handle, inbound_rx));

    tracing::info!(
        "Established SSE stream with session ID: {} ({} active)",
        session_id,
        state.sessions.len()
    );

    Ok(Sse::new(session_stream(guard, transport, outbound_rx)).keep_alive(KeepAlive::default()))
}

fn session_stream(
    guard: SessionGuard,
    transport: SseTransport,
    mut outbound: mpsc::Receiver<String>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    async_stream::stream! {
        let _guard = guard;

        yield Ok::<_, Infallible>(Event::default().event("endpoint").data(transport.endpoint()));

        loop {
            let next = tokio::select! {
                _ = transport.closed.cancelled() => None,
                message = outbound.recv() => message,
            };

            match next {
                Some(message) => yield Ok(Event::default().event("message").data(message)),
                None => break,
            }
        }
    }
}

// Processes one session's messages strictly in order
async fn run_session(
    handle: Arc<SessionHandle>,
    mut inbound: mpsc::UnboundedReceiver<JsonRpcRequest>,
) {
    let transport = handle.transport();

    loop {
        let request = tokio::select! {
            _ = transport.closed.cancelled() => None,
            request = inbound.recv() => request,
        };
        let Some(request) = request else { break };

        let Some(response) = handle.server().handle_request(request).await else {
            continue;
        };

        if transport.send(&response).await.is_err() {
            tracing::debug!(
                "Session {} closed, discarding response",
                handle.session_id()
            );
            break;
        }
    }

    tracing::debug!("Session worker for {} stopped", handle.session_id());
}

#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}

/// `POST /messages?sessionId=...`
pub async fn post_message(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MessageQuery>,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let session_id = query
        .session_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| {
            tracing::error!("No session ID provided in request URL");
            ApiError::bad_request("Missing sessionId parameter")
        })?;

    let handle = state.sessions.get(&session_id).ok_or_else(|| {
        tracing::error!("No active transport found for session ID: {}", session_id);
        ApiError::not_found("Session not found")
    })?;

    let request: JsonRpcRequest = serde_json::from_slice(&body).map_err(|e| {
        ApiError::bad_request_with_details("Invalid JSON-RPC message", e.to_string())
    })?;

    tracing::debug!("Message for session {}: {}", session_id, request.method);

    handle
        .deliver(request)
        .map_err(|e| ApiError::not_found(e.to_string()))?;

    Ok((StatusCode::ACCEPTED, "Accepted"))
}
