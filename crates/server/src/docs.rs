use crate::api::{ApiError, ApiResult};
use crate::config::AppState;
use axum::{
    extract::State,
    http::header,
    response::{Html, IntoResponse, Redirect},
    Json,
};
use std::sync::Arc;

const DOCS_UNAVAILABLE: &str = "API documentation not available";

// The page is always re-fetched so a redeployed document shows up immediately
const NO_CACHE: [(header::HeaderName, &str); 3] = [
    (header::CACHE_CONTROL, "no-cache, no-store, must-revalidate, max-age=0"),
    (header::PRAGMA, "no-cache"),
    (header::EXPIRES, "0"),
];

/// `GET /`
pub async fn redirect_to_docs() -> Redirect {
    Redirect::to("/docs")
}

/// Swagger UI over the configured OpenAPI document
pub async fn docs_page(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    if state.docs.is_none() {
        return Err(ApiError::not_found(DOCS_UNAVAILABLE));
    }

    Ok((NO_CACHE, Html(include_str!("docs.html"))))
}

/// The raw OpenAPI document
pub async fn openapi_document(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let doc = state
        .docs
        .as_ref()
        .ok_or_else(|| ApiError::not_found(DOCS_UNAVAILABLE))?;

    Ok((NO_CACHE, Json(doc.as_ref().clone())))
}
