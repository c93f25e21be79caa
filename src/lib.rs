//! stackchat - client and demo drivers for a Llama Stack server
//!
//! A Rust client for a Llama-Stack-style inference server, built around a
//! client-side tool-calling conversation loop, plus the demo drivers that
//! exercise it: inline function calling, MCP-served tools, server-side
//! agents with safety shields, and a minimal RAG pipeline.
//!
//! # Architecture
//!
//! - **Core**: Shared types, configuration, and error handling
//! - **Client**: The inference seam and the stack HTTP client
//! - **Tools**: Tool trait, registry, invoker, and MCP-backed tools
//! - **Agent**: The conversation loop and the streaming turn reader
//! - **RAG**: Document loading, markdown stripping, ingest and retrieval
//! - **Demos**: One driver per demonstration scenario
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use stackchat::agent::ConversationLoop;
//! use stackchat::client::StackClient;
//! use stackchat::tools::favorites;
//! use stackchat::Config;
//!
//! #[tokio::main]
//! async fn main() -> stackchat::Result<()> {
//!     let config = Config::load();
//!     let client = StackClient::from_config(&config)?;
//!     let registry = Arc::new(favorites::demo_registry()?);
//!
//!     let mut chat = ConversationLoop::new(client, registry);
//!     let answer = chat
//!         .ask("My city is Ottawa and my country is Canada, what is my favorite color?")
//!         .await?;
//!     println!("{}", answer);
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod client;
pub mod core;
pub mod demos;
pub mod rag;
pub mod tools;

// Re-export commonly used items
pub use agent::{ConversationLoop, StreamingTurnReader, TurnOutcome};
pub use client::{InferenceClient, StackClient};
pub use core::{Config, Result, StackchatError};
pub use tools::ToolRegistry;
