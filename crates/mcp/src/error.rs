// Protocol-level errors raised while handling tool calls

use crate::protocol::{
    JsonRpcError, INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND,
};

pub type McpResult<T> = Result<T, McpError>;

/// An error that maps onto a JSON-RPC error object
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum McpError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    MethodNotFound(String),

    #[error("{0}")]
    InvalidParams(String),

    #[error("{0}")]
    Internal(String),
}

impl McpError {
    pub fn unknown_tool(name: &str) -> Self {
        Self::MethodNotFound(format!("Unknown tool: {}", name))
    }

    /// Wrap a failure from a known tool. The message keeps the tool name.
    pub fn tool_failed(name: &str, err: impl std::fmt::Display) -> Self {
        Self::Internal(format!("Error executing tool {}: {}", name, err))
    }

    pub fn code(&self) -> i32 {
        match self {
            Self::InvalidRequest(_) => INVALID_REQUEST,
            Self::MethodNotFound(_) => METHOD_NOT_FOUND,
            Self::InvalidParams(_) => INVALID_PARAMS,
            Self::Internal(_) => INTERNAL_ERROR,
        }
    }
}

impl From<McpError> for JsonRpcError {
    fn from(err: McpError) -> Self {
        JsonRpcError::custom(err.code(), err.to_string())
    }
}
