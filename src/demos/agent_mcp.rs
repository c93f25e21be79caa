//! Server-side agent using the MCP toolgroup
//!
//! The stack runs the tool loop itself here; the client only creates the
//! agent and session, then drains each turn's event stream.

use crate::agent::StreamingTurnReader;
use crate::client::{AgentConfig, StackClient};
use crate::core::{Config, Message, Result};
use crate::demos::FAVORITE_QUESTIONS;

pub async fn run(config: &Config) -> Result<()> {
    let client = StackClient::from_config(config)?;

    let agent_config = AgentConfig::new(config.model.id.clone(), "You are a helpful assistant")
        .with_toolgroup(config.mcp.toolgroup_id.clone())
        .with_max_infer_iters(config.chat.max_iterations);
    let agent_id = client.create_agent(&agent_config).await?;
    let session_id = client.create_session(&agent_id, "agent1").await?;

    let reader = StreamingTurnReader::new();

    for &question in FAVORITE_QUESTIONS {
        println!("QUESTION: {}", question);
        match client
            .create_turn_stream(&agent_id, &session_id, &[Message::user(question)])
            .await
        {
            Ok(stream) => {
                let outcome = reader.read(stream).await;
                if let Some(error) = &outcome.error {
                    println!("  ERROR: {}", error);
                }
                println!("  RESPONSE: {}", outcome.content);
            }
            Err(e) => println!("  ERROR: {}", e),
        }
    }

    Ok(())
}
