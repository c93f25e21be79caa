//! Agent module - conversation orchestration
//!
//! Contains the client-side tool-calling loop and the reader for streaming
//! turns produced by server-side agents.

pub mod chat_loop;
pub mod stream;

pub use chat_loop::{ConversationLoop, LoopState};
pub use stream::{StreamingTurnReader, TurnOutcome};
