use crate::sse::SessionRegistry;
use anyhow::{Context, Result};
use mobilesms_core::config::{BASE_URL_ENV, DEFAULT_BASE_URL};
use mobilesms_core::{UpstreamClient, UpstreamConfig};
use mobilesms_mcp::tools::{sms_catalog, ToolRegistry};
use mobilesms_mcp::McpServer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Public URL used in the setup guides
    #[serde(default = "default_public_url")]
    pub public_url: String,

    #[serde(default)]
    pub upstream: UpstreamSettings,

    #[serde(default)]
    pub docs: DocsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocsConfig {
    /// OpenAPI document rendered at `/docs`
    #[serde(default = "default_spec_path")]
    pub spec_path: PathBuf,
}

fn default_public_url() -> String {
    "https://mcp.mobilesms.io".to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_spec_path() -> PathBuf {
    PathBuf::from("swagger.json")
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            spec_path: default_spec_path(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            public_url: default_public_url(),
            upstream: UpstreamSettings::default(),
            docs: DocsConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn load(config_path: &Path) -> Result<Self> {
        // Load config file if it exists, otherwise use defaults
        let mut config: Self = if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .context("Failed to read configuration file")?;
            toml::from_str(&content).context("Failed to parse configuration file")?
        } else {
            tracing::info!("Configuration file not found, using defaults");
            Self::default()
        };

        if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
            if !base_url.is_empty() {
                config.upstream.base_url = base_url;
            }
        }

        // Fail at startup rather than on the first connection
        Url::parse(&config.upstream.base_url).context("Invalid upstream base URL")?;

        Ok(config)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream.timeout_secs)
    }

    /// Build a fresh upstream configuration for one caller
    pub fn upstream_config(&self, api_key: &str) -> Result<UpstreamConfig> {
        Ok(UpstreamConfig::parse(&self.upstream.base_url, api_key)?
            .with_timeout(self.upstream_timeout()))
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub registry: Arc<ToolRegistry>,
    pub sessions: SessionRegistry,
    /// Shared connection pool; API keys stay per caller
    pub http: reqwest::Client,
    pub docs: Option<Arc<Value>>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Result<Self> {
        let http = UpstreamClient::http_client(&config.upstream_config("")?)
            .context("Failed to create HTTP client")?;
        let docs = load_docs(&config.docs.spec_path).map(Arc::new);

        Ok(Self {
            config: Arc::new(config),
            registry: Arc::new(sms_catalog()),
            sessions: SessionRegistry::new(),
            http,
            docs,
        })
    }

    /// Create a protocol-server instance bound to `api_key`
    pub fn mcp_server_for(&self, api_key: &str) -> Result<McpServer> {
        let config = self.config.upstream_config(api_key)?;
        let client = UpstreamClient::with_http_client(self.http.clone(), config);
        Ok(McpServer::new(self.registry.clone(), client))
    }
}

fn load_docs(path: &Path) -> Option<Value> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => {
            tracing::warn!(
                "Could not load {}, API documentation will not be available",
                path.display()
            );
            return None;
        }
    };

    match serde_json::from_str(&content) {
        Ok(doc) => Some(doc),
        Err(e) => {
            tracing::warn!("Invalid OpenAPI document {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig::load(&dir.path().join("absent.toml")).unwrap();

        assert_eq!(config.upstream.timeout_secs, 30);
        assert_eq!(config.public_url, "https://mcp.mobilesms.io");
        assert_eq!(config.docs.spec_path, PathBuf::from("swagger.json"));
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
public_url = "https://sms.internal"

[upstream]
timeout_secs = 5

[docs]
spec_path = "docs/openapi.json"
"#
        )
        .unwrap();

        let config = ServerConfig::load(file.path()).unwrap();

        assert_eq!(config.public_url, "https://sms.internal");
        assert_eq!(config.upstream_timeout(), Duration::from_secs(5));
        assert_eq!(config.docs.spec_path, PathBuf::from("docs/openapi.json"));
    }

    #[test]
    fn test_upstream_config_is_per_caller() {
        let mut config = ServerConfig::default();
        config.upstream.base_url = "https://example.com/api.php".to_string();

        let a = config.upstream_config("key-a").unwrap();
        let b = config.upstream_config("key-b").unwrap();

        assert_eq!(a.api_key, "key-a");
        assert_eq!(b.api_key, "key-b");
        assert_eq!(a.base_url, b.base_url);
    }

    #[test]
    fn test_missing_docs_file() {
        assert!(load_docs(Path::new("/nonexistent/swagger.json")).is_none());
    }

    #[test]
    fn test_env_base_url_overrides_file() {
        // Only test in this crate that touches the variable
        let previous = std::env::var(BASE_URL_ENV).ok();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[upstream]
base_url = "https://file.example/api.php"
"#
        )
        .unwrap();

        std::env::set_var(BASE_URL_ENV, "https://env.example/api.php");
        let config = ServerConfig::load(file.path()).unwrap();
        assert_eq!(config.upstream.base_url, "https://env.example/api.php");

        std::env::remove_var(BASE_URL_ENV);
        let config = ServerConfig::load(file.path()).unwrap();
        assert_eq!(config.upstream.base_url, "https://file.example/api.php");

        if let Some(value) = previous {
            std::env::set_var(BASE_URL_ENV, value);
        }
    }
}
