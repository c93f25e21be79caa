//! Function calling with in-process tools
//!
//! Runs the favorites question batch through the conversation loop with the
//! two demo tools registered locally. The whole batch shares one history, so
//! the model can gather the city and country across turns.

use std::sync::Arc;

use crate::agent::ConversationLoop;
use crate::client::StackClient;
use crate::core::{Config, Result};
use crate::demos::FAVORITE_QUESTIONS;
use crate::tools::favorites;

const SYSTEM_PROMPT: &str =
    "only answer questions about a favorite color by using the response from the favorite_color_tool \
     only answer questions about a favorite hockey team by using the response from the favorite_hockey_tool \
     when asked for a favorite color if you have not called the favorite_color_tool, call it \
     Never guess a favorite color \
     Do not be chatty \
     Give short answers when possible";

pub async fn run(config: &Config) -> Result<()> {
    let client = StackClient::from_config(config)?;
    let registry = Arc::new(favorites::demo_registry()?);

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

    Ok(())
}
