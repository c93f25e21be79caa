//! Demonstration drivers
//!
//! One module per driver, each a plain entry point against a running stack
//! server. Drivers print each question and its answer; a failing question is
//! reported and the batch continues.

pub mod agent_mcp;
pub mod function_calling;
pub mod guardrails;
pub mod local_mcp;
pub mod rag_agent;
pub mod rag_chat;
pub mod register_mcp;

/// Questions exercising the favorites tools, including multi-turn parameter
/// gathering and questions the tools cannot answer
pub const FAVORITE_QUESTIONS: &[&str] = &[
    "What is my favorite color?",
    "My city is Ottawa",
    "My country is Canada",
    "I moved to Montreal. What is my favorite color now?",
    "My city is Montreal and my country is Canada",
    "What is the fastest car in the world?",
    "My city is Ottawa and my country is Canada, what is my favorite color?",
    "What is my favorite hockey team ?",
    "My city is Montreal and my country is Canada",
    "Who was the first president of the United States?",
];
