//! Custom error types for stackchat
//!
//! Provides a unified error handling system across all modules.

use thiserror::Error;

/// Main error type for stackchat operations
#[derive(Error, Debug)]
pub enum StackchatError {
    /// Stack server connection or API errors
    #[error("stack API error: {0}")]
    Stack(String),

    /// The conversation loop hit its inference iteration bound
    #[error("tool loop exceeded {limit} inference iterations")]
    ToolLoopExceeded { limit: usize },

    /// A tool with this name is already registered
    #[error("tool '{0}' is already registered")]
    DuplicateTool(String),

    /// Tool execution errors (absorbed into tool messages by the invoker)
    #[error("tool execution error: {0}")]
    ToolExecution(String),

    /// MCP server transport or protocol errors
    #[error("MCP error: {0}")]
    Mcp(String),

    /// Stream transport errors
    #[error("stream error: {0}")]
    Stream(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type for stackchat operations
pub type Result<T> = std::result::Result<T, StackchatError>;

impl StackchatError {
    /// Create a stack API error
    pub fn stack(msg: impl Into<String>) -> Self {
        Self::Stack(msg.into())
    }

    /// Create a tool execution error
    pub fn tool(msg: impl Into<String>) -> Self {
        Self::ToolExecution(msg.into())
    }

    /// Create an MCP error
    pub fn mcp(msg: impl Into<String>) -> Self {
        Self::Mcp(msg.into())
    }

    /// Create a stream error
    pub fn stream(msg: impl Into<String>) -> Self {
        Self::Stream(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
