//! Tool-calling conversation loop
//!
//! Alternates between inference turns and tool execution until the model
//! answers in plain text. The loop owns the message history; tools and the
//! inference client are injected by the caller.

use std::sync::Arc;

use crate::client::InferenceClient;
use crate::core::{Message, Result, StackchatError, ToolCall, ToolDeclaration};
use crate::tools::{invoker, ToolRegistry};

/// State of one question's inference loop
#[derive(Debug, Clone)]
pub struct LoopState {
    /// Completed inference round-trips
    pub iteration: usize,
    /// Maximum allowed round-trips
    pub max_iterations: usize,
    /// Final answer once the model stops requesting tools
    pub final_answer: Option<String>,
}

impl LoopState {
    /// Create a new loop state with the given iteration bound
    pub fn new(max_iterations: usize) -> Self {
        Self {
            iteration: 0,
            max_iterations,
            final_answer: None,
        }
    }

    /// Check if the loop should request another turn
    pub fn should_continue(&self) -> bool {
        self.iteration < self.max_iterations && self.final_answer.is_none()
    }

    /// Record a completed round-trip
    pub fn next_iteration(&mut self) {
        self.iteration += 1;
    }
}

/// Callback invoked for each tool call the model requests
pub type ToolObserver = Box<dyn Fn(&ToolCall) + Send + Sync>;

/// Drives a conversation against an inference client and a tool registry
///
/// History persists across [`ask`](ConversationLoop::ask) calls, so a batch
/// of questions shares one conversation the way a chat session would. The
/// tool declarations are captured once at construction and passed unchanged
/// to every inference call.
pub struct ConversationLoop<C> {
    client: C,
    registry: Arc<ToolRegistry>,
    declarations: Vec<ToolDeclaration>,
    history: Vec<Message>,
    max_iterations: usize,
    verbose: bool,
    tool_observer: Option<ToolObserver>,
}

impl<C: InferenceClient> ConversationLoop<C> {
    /// Create a loop over the given client and registry
    pub fn new(client: C, registry: Arc<ToolRegistry>) -> Self {
        let declarations = registry.declarations();
        Self {
            client,
            registry,
            declarations,
            history: Vec::new(),
            max_iterations: 10,
            verbose: false,
            tool_observer: None,
        }
    }

    /// Seed the history with a system message
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.history.insert(0, Message::system(prompt));
        self
    }

    /// Set the inference iteration bound per question
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Enable debug output
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Observe each tool call the model requests
    pub fn with_tool_observer(mut self, observer: impl Fn(&ToolCall) + Send + Sync + 'static) -> Self {
        self.tool_observer = Some(Box::new(observer));
        self
    }

    /// The conversation history so far
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Ask one question, driving tools until the model answers in text
    ///
    /// Appends the user message, then alternates inference and tool
    /// execution: every tool call in a turn is resolved (in the order the
    /// model emitted them) and appended before inference runs again. Tool
    /// failures are reported back to the model as tool messages; inference
    /// failures propagate. Exceeding the iteration bound fails with
    /// [`StackchatError::ToolLoopExceeded`], leaving the history intact for
    /// inspection.
    pub async fn ask(&mut self, question: &str) -> Result<String> {
        self.history.push(Message::user(question));

        let mut state = LoopState::new(self.max_iterations);

        while state.should_continue() {
            let turn = self
                .client
                .chat_completion(&self.history, &self.declarations)
                .await?;

            let tool_calls = turn.tool_calls.clone();
            let content = turn.content.clone();
            self.history.push(turn.into_message());

            if tool_calls.is_empty() {
                state.final_answer = Some(content);
                break;
            }

            for call in &tool_calls {
                if self.verbose {
                    eprintln!("DEBUG tool call: {} {}", call.tool_name, call.arguments);
                }
                if let Some(observer) = &self.tool_observer {
                    observer(call);
                }
                let result = invoker::invoke(call, &self.registry).await;
                self.history.push(result);
            }

            state.next_iteration();
        }

        state.final_answer.ok_or(StackchatError::ToolLoopExceeded {
            limit: self.max_iterations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loop_state_new() {
        let state = LoopState::new(10);
        assert_eq!(state.iteration, 0);
        assert_eq!(state.max_iterations, 10);
        assert!(state.final_answer.is_none());
    }

    #[test]
    fn test_should_continue() {
        let mut state = LoopState::new(2);
        assert!(state.should_continue());

        state.next_iteration();
        assert!(state.should_continue());

        state.next_iteration();
        assert!(!state.should_continue()); // Reached the bound
    }

    #[test]
    fn test_final_answer_stops_loop() {
        let mut state = LoopState::new(10);
        state.final_answer = Some("done".to_string());
        assert!(!state.should_continue());
    }
}
