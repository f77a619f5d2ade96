//! Upstream configuration for the SMS REST API.

use crate::error::{UpstreamError, UpstreamResult};
use std::fmt;
use std::time::Duration;
use url::Url;

/// Endpoint used when neither the CLI nor the environment names one.
pub const DEFAULT_BASE_URL: &str = "https://mobilesms.io/webapp/api.php";

/// Environment variable overriding the upstream endpoint.
pub const BASE_URL_ENV: &str = "SMS_API_BASE_URL";

/// Fixed timeout applied to every upstream call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for one caller of the upstream API.
///
/// A config is immutable once built. The stdio adapter builds one at startup,
/// the HTTP adapter builds one per SSE connection or per `/mcp` request.
#[derive(Clone, PartialEq, Eq)]
pub struct UpstreamConfig {
    /// Base URL of the upstream endpoint.
    pub base_url: Url,
    /// API key sent as the `key` query parameter.
    pub api_key: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl UpstreamConfig {
    /// Create a configuration with the default timeout.
    pub fn new(base_url: Url, api_key: impl Into<String>) -> Self {
        Self {
            base_url,
            api_key: api_key.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Parse `base_url` and build a configuration from it.
    pub fn parse(base_url: &str, api_key: impl Into<String>) -> UpstreamResult<Self> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(UpstreamError::Config(format!(
                "base URL is not hierarchical: {}",
                base_url
            )));
        }
        Ok(Self::new(base_url, api_key))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether an API key was provided at all.
    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }
}

impl fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &redact_api_key(&self.api_key))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Resolve the upstream base URL: explicit value, then `SMS_API_BASE_URL`, then the default.
pub fn resolve_base_url(explicit: Option<&str>) -> String {
    explicit
        .map(str::to_string)
        .filter(|url| !url.is_empty())
        .or_else(|| std::env::var(BASE_URL_ENV).ok().filter(|url| !url.is_empty()))
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
}

/// Shorten an API key for log output. Never shows more than 8 characters.
pub fn redact_api_key(api_key: &str) -> String {
    if api_key.is_empty() {
        return "<none>".to_string();
    }
    let prefix: String = api_key.chars().take(8).collect();
    format!("{}...", prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = UpstreamConfig::parse("https://example.com/api.php", "secret").unwrap();

        assert_eq!(config.base_url.as_str(), "https://example.com/api.php");
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.has_api_key());
    }

    #[test]
    fn test_config_rejects_non_base_url() {
        let result = UpstreamConfig::parse("mailto:ops@example.com", "secret");
        assert!(matches!(result, Err(UpstreamError::Config(_))));

        let result = UpstreamConfig::parse("not a url", "secret");
        assert!(matches!(result, Err(UpstreamError::InvalidUrl(_))));
    }

    #[test]
    fn test_redact_api_key() {
        assert_eq!(redact_api_key("abcdefghijklmnop"), "abcdefgh...");
        assert_eq!(redact_api_key("abc"), "abc...");
        assert_eq!(redact_api_key(""), "<none>");
        // Multi-byte keys must not be split mid-character
        assert_eq!(redact_api_key("ключключключ"), "ключключ...");
    }

    #[test]
    fn test_debug_redacts_key() {
        let config =
            UpstreamConfig::parse("https://example.com/api.php", "sk-live-0123456789").unwrap();
        let debug = format!("{:?}", config);

        assert!(debug.contains("sk-live-..."));
        assert!(!debug.contains("0123456789"));
    }

    #[test]
    fn test_resolve_base_url_prefers_explicit() {
        assert_eq!(
            resolve_base_url(Some("https://override.example/api")),
            "https://override.example/api"
        );
    }

    #[test]
    fn test_resolve_base_url_env_then_default() {
        // Only test in this crate that touches the variable
        let previous = std::env::var(BASE_URL_ENV).ok();

        std::env::set_var(BASE_URL_ENV, "https://env.example/api.php");
        assert_eq!(resolve_base_url(None), "https://env.example/api.php");
        assert_eq!(resolve_base_url(Some("")), "https://env.example/api.php");
        assert_eq!(
            resolve_base_url(Some("https://flag.example/api.php")),
            "https://flag.example/api.php"
        );

        std::env::remove_var(BASE_URL_ENV);
        assert_eq!(resolve_base_url(None), DEFAULT_BASE_URL);

        if let Some(value) = previous {
            std::env::set_var(BASE_URL_ENV, value);
        }
    }
}
