//! Retrieval-augmented chat completion
//!
//! Ingests the docs directory into a fresh vector database, retrieves the
//! chunks relevant to each question, and asks the model with the retrieved
//! context stuffed into the prompt. The database is removed afterwards.

use std::sync::Arc;

use crate::agent::ConversationLoop;
use crate::client::StackClient;
use crate::core::{Config, Result};
use crate::rag;
use crate::tools::ToolRegistry;

const QUESTIONS: &[&str] = &["Should I use npm to start an application"];

pub async fn run(config: &Config) -> Result<()> {
    let client = StackClient::from_config(config)?;

    // Models served by ollama need registering before first use; an
    // already-registered model is not a reason to stop
    if let Some(provider_model_id) = &config.model.provider_model_id {
        if let Err(e) = client
            .register_model(&config.model.id, &config.model.provider_id, provider_model_id)
            .await
        {
            println!("Model registration skipped: {}", e);
        }
    }

    let vector_db_id = rag::ingest(&client, &config.rag).await?;

    let mut chat = ConversationLoop::new(client.clone(), Arc::new(ToolRegistry::new()))
        .with_system_prompt("Give short answers when possible")
        .with_max_iterations(config.chat.max_iterations)
        .with_verbose(config.chat.verbose);

    for &question in QUESTIONS {
        println!("QUESTION: {}", question);

        let chunks = rag::retrieve(&client, question, &vector_db_id).await?;
        if config.chat.verbose {
            for chunk in &chunks {
                eprintln!("DEBUG chunk: {}", chunk);
            }
        }

        let prompt = rag::build_context_prompt(question, &chunks);
        match chat.ask(&prompt).await {
            Ok(answer) => println!("  RESPONSE: {}", answer),
            Err(e) => println!("  ERROR: {}", e),
        }
    }

    client.unregister_vector_db(&vector_db_id).await?;
    Ok(())
}
