// MCP tool definitions and dispatch

use crate::error::{McpError, McpResult};
use crate::protocol::{CallToolParams, CallToolResult, ToolSchema};
use mobilesms_core::{ActionParams, UpstreamClient};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// A tool backed by one upstream action
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool schema for MCP
    fn schema(&self) -> ToolSchema;

    /// Example arguments, shown in the HTTP documentation endpoints
    fn example(&self) -> Value {
        serde_json::json!({})
    }

    /// Validate arguments and turn them into upstream query parameters
    fn upstream_params(&self, arguments: Value) -> McpResult<ActionParams>;

    /// Execute the tool against the caller's upstream client
    async fn execute(
        &self,
        client: &UpstreamClient,
        arguments: Value,
    ) -> McpResult<CallToolResult> {
        let name = self.schema().name;
        let params = self.upstream_params(arguments)?;

        let payload = client
            .request(&params)
            .await
            .map_err(|e| McpError::tool_failed(&name, e))?;

        Ok(CallToolResult::text(payload.to_text()))
    }
}

/// Deserialize tool arguments, reporting missing or mistyped fields as invalid params
pub fn parse_arguments<T: DeserializeOwned>(tool: &str, arguments: Value) -> McpResult<T> {
    serde_json::from_value(arguments)
        .map_err(|e| McpError::InvalidParams(format!("Invalid arguments for {}: {}", tool, e)))
}

/// Tool registry, kept in registration order so listings are stable
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Register a tool, replacing any tool with the same name
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.schema().name;
        match self.tools.iter().position(|t| t.schema().name == name) {
            Some(index) => self.tools[index] = tool,
            None => self.tools.push(tool),
        }
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.schema().name == name).cloned()
    }

    /// List all tool schemas
    pub fn list_schemas(&self) -> Vec<ToolSchema> {
        self.tools.iter().map(|t| t.schema()).collect()
    }

    pub fn tools(&self) -> impl Iterator<Item = &Arc<dyn Tool>> {
        self.tools.iter()
    }

    /// Check if a tool exists
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Route a call by exact name
    pub async fn dispatch(
        &self,
        client: &UpstreamClient,
        params: CallToolParams,
    ) -> McpResult<CallToolResult> {
        let tool = self
            .get(&params.name)
            .ok_or_else(|| McpError::unknown_tool(&params.name))?;

        tool.execute(client, params.arguments()).await
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// Helper functions for creating tool schemas

pub fn json_schema_object(properties: Value, required: Vec<&str>) -> Value {
    if required.is_empty() {
        serde_json::json!({
            "type": "object",
            "properties": properties
        })
    } else {
        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required
        })
    }
}

pub fn json_schema_string(description: &str) -> Value {
    serde_json::json!({
        "type": "string",
        "description": description
    })
}
