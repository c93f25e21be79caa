//! Server-side agent with the RAG toolgroup
//!
//! Ingests the docs directory, then lets the stack's knowledge-search tool
//! do the retrieval inside a server-side agent turn. The step observer
//! prints the chunks each search retrieved.

use serde_json::json;

use crate::agent::StreamingTurnReader;
use crate::client::{AgentConfig, StackClient};
use crate::core::{Config, Message, Result};
use crate::rag;

const QUESTIONS: &[&str] = &["Should I use npm to start a node.js application"];

pub async fn run(config: &Config) -> Result<()> {
    let client = StackClient::from_config(config)?;

    let vector_db_id = rag::ingest(&client, &config.rag).await?;

    let agent_config = AgentConfig::new(
        config.model.id.clone(),
        "You are a helpful assistant, answer questions only based on information in the documents provided",
    )
    .with_toolgroup_args(
        "builtin::rag/knowledge_search",
        json!({ "vector_db_ids": [vector_db_id.clone()] }),
    )
    .with_max_infer_iters(config.chat.max_iterations);

    let agent_id = client.create_agent(&agent_config).await?;
    let session_id = client.create_session(&agent_id, "agent1").await?;

    let reader = StreamingTurnReader::new().with_step_observer(print_retrieved_documents);

    for &question in QUESTIONS {
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

    client.unregister_vector_db(&vector_db_id).await?;
    Ok(())
}

/// Print the document chunks a knowledge-search step retrieved
fn print_retrieved_documents(details: &serde_json::Value) {
    let Some(responses) = details.get("tool_responses").and_then(|v| v.as_array()) else {
        return;
    };

    println!("{}", "=".repeat(60));
    println!("RAG DOCUMENTS RETRIEVED");
    println!("{}", "=".repeat(60));

    for response in responses {
        let Some(items) = response.get("content").and_then(|v| v.as_array()) else {
            continue;
        };
        for item in items {
            let Some(text) = item.get("text").and_then(|v| v.as_str()) else {
                continue;
            };
            // Result items look like "Result N\nContent: ...\nMetadata: ..."
            if let Some(content) = text.split("Content:").nth(1) {
                let content = content.split("\nMetadata:").next().unwrap_or(content).trim();
                println!("--- {} ---", text.lines().next().unwrap_or("Result"));
                println!("{}", content);
                println!("{}", "-".repeat(40));
            }
        }
    }

    println!("{}", "=".repeat(60));
}
