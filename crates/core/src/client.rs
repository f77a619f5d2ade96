//! HTTP client for the upstream SMS REST API.
//!
//! Every operation is a single `GET <base_url>?key=<api_key>&action=...`. The
//! response is either JSON or plain text; [`UpstreamPayload`] keeps that
//! distinction so callers can render it faithfully.

use crate::config::UpstreamConfig;
use crate::error::UpstreamResult;
use reqwest::{header, Client};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Query parameters for one upstream action, kept in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionParams {
    pairs: Vec<(String, String)>,
}

impl ActionParams {
    /// Start a parameter set for the given `action`.
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            pairs: vec![("action".to_string(), action.into())],
        }
    }

    /// Append a parameter.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.pairs.push((name.into(), value.into()));
        self
    }

    pub fn action(&self) -> &str {
        self.get("action").unwrap_or_default()
    }

    /// Look up the first value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Normalized upstream response body.
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamPayload {
    /// Body parsed as JSON.
    Json(Value),
    /// Body kept verbatim.
    Text(String),
}

impl UpstreamPayload {
    /// Normalize a textual body.
    ///
    /// Only bodies whose trimmed form starts with `{` are parsed; anything else,
    /// including JSON arrays, stays text. A failed parse also stays text.
    pub fn from_text(body: impl Into<String>) -> Self {
        let body = body.into();
        if body.trim().starts_with('{') {
            if let Ok(value) = serde_json::from_str::<Value>(&body) {
                return Self::Json(value);
            }
        }
        Self::Text(body)
    }

    /// Normalize a value that upstream already delivered as JSON.
    ///
    /// A JSON string gets the same treatment as a textual body, so a
    /// string-encoded object ends up equal to the object itself.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::String(text) => Self::from_text(text),
            other => Self::Json(other),
        }
    }

    /// Render the payload as the text of a tool result.
    ///
    /// Objects and arrays are pretty-printed with two-space indentation, other
    /// JSON scalars use their JSON rendering, text passes through unchanged.
    pub fn to_text(&self) -> String {
        match self {
            Self::Json(value @ (Value::Object(_) | Value::Array(_))) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
            Self::Json(Value::String(text)) => text.clone(),
            Self::Json(value) => value.to_string(),
            Self::Text(text) => text.clone(),
        }
    }
}

/// Client bound to one [`UpstreamConfig`] (one API key).
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
    config: Arc<UpstreamConfig>,
}

impl UpstreamClient {
    /// Create a client with its own connection pool.
    pub fn new(config: UpstreamConfig) -> UpstreamResult<Self> {
        let client = Self::http_client(&config)?;
        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    /// Create a client on top of an existing `reqwest::Client`.
    ///
    /// The per-request timeout from `config` is still applied.
    pub fn with_http_client(client: Client, config: UpstreamConfig) -> Self {
        Self {
            client,
            config: Arc::new(config),
        }
    }

    /// Build a `reqwest::Client` suitable for upstream calls.
    pub fn http_client(config: &UpstreamConfig) -> UpstreamResult<Client> {
        Ok(Client::builder()
            .user_agent(concat!("mobilesms-mcp/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()?)
    }

    /// Build the target URL: `key` first, then every action parameter.
    pub fn build_url(&self, params: &ActionParams) -> Url {
        let mut url = self.config.base_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("key", &self.config.api_key);
            for (name, value) in params.iter() {
                query.append_pair(name, value);
            }
        }
        url
    }

    /// Perform one upstream call and normalize its body.
    pub async fn request(&self, params: &ActionParams) -> UpstreamResult<UpstreamPayload> {
        let url = self.build_url(params);
        debug!(
            base_url = %self.config.base_url,
            action = params.action(),
            "Upstream GET request"
        );

        let response = self
            .client
            .get(url)
            .timeout(self.config.timeout)
            .send()
            .await?;

        let status = response.status();
        let is_json = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.contains("json"))
            .unwrap_or(false);

        let body = response.text().await?;

        if !status.is_success() {
            return Err(crate::error::UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        if is_json {
            if let Ok(value) = serde_json::from_str::<Value>(&body) {
                return Ok(UpstreamPayload::from_json(value));
            }
        }

        Ok(UpstreamPayload::from_text(body))
    }
}
