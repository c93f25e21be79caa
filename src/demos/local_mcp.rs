//! Function calling with tools from a local MCP server
//!
//! Spawns the configured MCP server, registers every tool it serves, and
//! runs the same question batch through the same conversation loop as the
//! in-process variant. Only the tool transport differs.

use std::sync::Arc;

use crate::agent::ConversationLoop;
use crate::client::StackClient;
use crate::core::{Config, Result};
use crate::demos::FAVORITE_QUESTIONS;
use crate::tools::mcp::{self, McpSession};

const SYSTEM_PROMPT: &str =
    "only answer questions about a favorite color by using the response from the favorite_color_tool \
     only answer questions about a favorite hockey team by using the response from the favorite_hockey_tool \
     when asked for a favorite color if you have not called the favorite_color_tool, call it \
     if the assistant does not have the parameters to call a tool, ask the user for them by name \
     Never guess a favorite color \
     Do not be chatty \
     Give short answers when possible";

pub async fn run(config: &Config) -> Result<()> {
    let session = Arc::new(McpSession::connect(&config.mcp.command, &config.mcp.args).await?);
    let registry = Arc::new(mcp::registry_from_session(&session).await?);
    println!("Connected to MCP server with {} tool(s)", registry.len());

    let client = StackClient::from_config(config)?;
    let mut chat = ConversationLoop::new(client, registry)
        .with_system_prompt(SYSTEM_PROMPT)
        .with_max_iterations(config.chat.max_iterations)
        .with_verbose(config.chat.verbose)
        .with_tool_observer(|call| println!("  CALLED: {}", call.tool_name));

    for &question in FAVORITE_QUESTIONS {
        println!("QUESTION: {}", question);
        match chat.ask(question).await {
            Ok(answer) => println!("  RESPONSE: {}", answer),
            Err(e) => println!("  ERROR: {}", e),
        }
    }

    session.shutdown().await?;
    Ok(())
}
