//! Error types for upstream calls.

/// Result type for upstream operations.
pub type UpstreamResult<T> = Result<T, UpstreamError>;

/// Errors raised while talking to the upstream SMS API.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    /// The request did not complete within the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// Upstream answered with a non-success status.
    #[error("Request failed with status code {status}: {body}")]
    Status { status: u16, body: String },

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            // The request URL carries the API key in its query
            Self::Http(err.without_url())
        }
    }
}
