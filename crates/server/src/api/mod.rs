use crate::config::AppState;
use crate::docs;
use crate::sse::{self, SessionRegistry};
use anyhow::Result;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultOnResponse, TraceLayer},
};

mod handlers;
mod rpc;

/// Start the API server
pub async fn serve(addr: &str, state: AppState) -> Result<()> {
    let sessions = state.sessions.clone();
    let app = create_router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("SMS MCP SSE Server listening on {}", addr);
    tracing::info!("MCP SSE endpoint: http://{}/sse?apiKey=YOUR_API_KEY", addr);
    tracing::info!("HTTP MCP endpoint: http://{}/mcp (X-API-Key header)", addr);
    tracing::info!("API docs: http://{}/docs", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(sessions))
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // MCP transports
        .route("/sse", get(sse::sse_connect))
        .route(sse::MESSAGES_PATH, post(sse::post_message))
        .route("/mcp", post(rpc::handle_rpc))
        // Static information
        .route("/health", get(handlers::health_check))
        .route("/api/info", get(handlers::api_info))
        .route("/tools", get(handlers::list_tools))
        .route("/setup/guide", get(handlers::setup_guide))
        .route("/setup/claude-code-config", get(handlers::claude_code_config))
        // Documentation
        .route("/", get(docs::redirect_to_docs))
        .route("/docs", get(docs::docs_page))
        .route("/docs/swagger.json", get(docs::openapi_document))
        // Middleware
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(request_span)
                .on_response(DefaultOnResponse::new()),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// Path only: `/sse` carries the API key in its query string
fn request_span(request: &Request<Body>) -> tracing::Span {
    tracing::debug_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
    )
}

/// Wait for Ctrl+C (or SIGTERM) and close every open SSE session
async fn shutdown_signal(sessions: SessionRegistry) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutting down server...");
    let closed = sessions.close_all();
    tracing::info!("Closed {} SSE session(s)", closed);
}

/// API error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

/// Error type for API handlers, rendered as `ErrorResponse`
pub struct ApiError {
    status: StatusCode,
    error: anyhow::Error,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<anyhow::Error>) -> Self {
        Self {
            status,
            error: error.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, anyhow::Error::msg(message.into()))
    }

    pub fn bad_request_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        let error = anyhow::Error::msg(details.into()).context(message.into());
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, anyhow::Error::msg(message.into()))
    }

}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_msg = self.error.to_string();
        let details = self
            .error
            .chain()
            .skip(1)
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join(": ");

        let response = if details.is_empty() {
            ErrorResponse::new(error_msg)
        } else {
            ErrorResponse::with_details(error_msg, details)
        };

        (self.status, Json(response)).into_response()
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err)
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
