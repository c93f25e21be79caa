//! Inference client seam
//!
//! The conversation loop depends on this trait only, so the HTTP client can
//! be swapped for a scripted double in tests.

use async_trait::async_trait;

use crate::core::{AssistantTurn, Message, Result, ToolDeclaration};

/// A source of assistant turns
///
/// Given the conversation history and the advertised tool declarations,
/// returns one assistant turn which may request zero or more tool calls.
/// Implementations may fail with a transport or service fault; the loop
/// surfaces those to its caller unchanged.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Request one assistant turn for the given history
    async fn chat_completion(
        &self,
        messages: &[Message],
        tools: &[ToolDeclaration],
    ) -> Result<AssistantTurn>;
}

#[async_trait]
impl<T: InferenceClient + ?Sized> InferenceClient for std::sync::Arc<T> {
    async fn chat_completion(
        &self,
        messages: &[Message],
        tools: &[ToolDeclaration],
    ) -> Result<AssistantTurn> {
        (**self).chat_completion(messages, tools).await
    }
}
