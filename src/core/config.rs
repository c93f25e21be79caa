//! Configuration management for stackchat
//!
//! Supports environment variables, config files, and runtime overrides.
//!
//! Config file location: ~/.config/stackchat/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::core::error::{Result, StackchatError};

/// Main configuration for stackchat
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Stack server configuration
    pub stack: StackConfig,
    /// Model configuration
    pub model: ModelConfig,
    /// Conversation loop configuration
    pub chat: ChatConfig,
    /// MCP server configuration
    #[serde(default)]
    pub mcp: McpConfig,
    /// RAG configuration
    #[serde(default)]
    pub rag: RagConfig,
}

/// Stack server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackConfig {
    /// Base URL of the stack server
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model used for inference
    pub id: String,
    /// Provider to register models against
    pub provider_id: String,
    /// Provider-side model id, registered before use when set
    #[serde(default)]
    pub provider_model_id: Option<String>,
    /// Guard model registered for the guardrails driver
    pub guard_id: String,
    /// Provider-side id of the guard model
    pub guard_provider_model_id: String,
}

/// Conversation loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Maximum inference round-trips per question before giving up
    /// Default: 10
    pub max_iterations: usize,
    /// Whether to show debug output
    pub verbose: bool,
}

/// MCP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpConfig {
    /// Command that starts the local MCP server
    pub command: String,
    /// Arguments for the server command
    pub args: Vec<String>,
    /// Endpoint the stack uses to reach the MCP server
    pub endpoint_uri: String,
    /// Toolgroup id registered for the MCP server
    pub toolgroup_id: String,
}

/// RAG configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    /// Directory of markdown documents to ingest
    pub docs_dir: String,
    /// Embedding model for the vector database
    pub embedding_model: String,
    /// Embedding dimension for the vector database
    pub embedding_dimension: u32,
    /// Chunk size used by server-side document splitting
    pub chunk_size_in_tokens: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stack: StackConfig::default(),
            model: ModelConfig::default(),
            chat: ChatConfig::default(),
            mcp: McpConfig::default(),
            rag: RagConfig::default(),
        }
    }
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            base_url: env::var("STACKCHAT_URL")
                .unwrap_or_else(|_| "http://localhost:8321".to_string()),
            timeout_secs: 120,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            id: env::var("STACKCHAT_MODEL")
                .unwrap_or_else(|_| "meta-llama/Llama-3.1-8B-Instruct".to_string()),
            provider_id: "ollama".to_string(),
            provider_model_id: None,
            guard_id: "meta-llama/Llama-Guard-3-8B".to_string(),
            guard_provider_model_id: "llama-guard3:8b".to_string(),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            verbose: env::var("STACKCHAT_VERBOSE")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        }
    }
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            command: env::var("STACKCHAT_MCP_COMMAND").unwrap_or_else(|_| "python".to_string()),
            args: vec!["favorite-server/server.py".to_string()],
            endpoint_uri: "http://localhost:8002/sse".to_string(),
            toolgroup_id: "mcp::mcp_favorites".to_string(),
        }
    }
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            docs_dir: env::var("STACKCHAT_DOCS_DIR").unwrap_or_else(|_| "docs".to_string()),
            embedding_model: "all-MiniLM-L6-v2".to_string(),
            embedding_dimension: 384,
            chunk_size_in_tokens: 125,
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("stackchat")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file, environment, and defaults
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load() -> Self {
        // Try to load .env file if it exists
        let _ = dotenvy::dotenv();

        if let Ok(config) = Self::load_from_file() {
            return config;
        }

        // Fall back to defaults (which respect env vars)
        Self::default()
    }

    /// Load configuration from file only
    pub fn load_from_file() -> Result<Self> {
        let config_path = Self::config_file();

        if !config_path.exists() {
            return Err(StackchatError::config("Config file not found"));
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|e| StackchatError::config(format!("Failed to read config: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| StackchatError::config(format!("Failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_dir = Self::config_dir();
        let config_path = Self::config_file();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .map_err(|e| StackchatError::config(format!("Failed to create config dir: {}", e)))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| StackchatError::config(format!("Failed to serialize config: {}", e)))?;

        fs::write(&config_path, content)
            .map_err(|e| StackchatError::config(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Base URL with any trailing slash removed
    pub fn stack_url(&self) -> String {
        self.stack.base_url.trim_end_matches('/').to_string()
    }
}
