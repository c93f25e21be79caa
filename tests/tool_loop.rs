//! Conversation loop integration tests
//!
//! Drives the loop, registry, and invoker together against a scripted
//! inference client, checking the call counts and the shape of the history
//! each scenario leaves behind.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use stackchat::agent::ConversationLoop;
use stackchat::client::InferenceClient;
use stackchat::core::types::{AssistantTurn, Message, Role, ToolCall, ToolDeclaration};
use stackchat::core::{Result, StackchatError};
use stackchat::tools::favorites;
use stackchat::tools::{FunctionTool, ToolRegistry};

/// Inference double that replays a fixed sequence of turns
struct ScriptedClient {
    turns: Mutex<VecDeque<AssistantTurn>>,
    calls: AtomicUsize,
    message_counts: Mutex<Vec<usize>>,
}

impl ScriptedClient {
    fn new(turns: Vec<AssistantTurn>) -> Arc<Self> {
        Arc::new(Self {
            turns: Mutex::new(turns.into()),
            calls: AtomicUsize::new(0),
            message_counts: Mutex::new(Vec::new()),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// History length seen at each inference call
    fn message_counts(&self) -> Vec<usize> {
        self.message_counts.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceClient for ScriptedClient {
    async fn chat_completion(
        &self,
        messages: &[Message],
        _tools: &[ToolDeclaration],
    ) -> Result<AssistantTurn> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.message_counts.lock().unwrap().push(messages.len());
        self.turns
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| StackchatError::stack("no scripted turn left"))
    }
}

fn text_turn(content: &str) -> AssistantTurn {
    AssistantTurn {
        content: content.to_string(),
        stop_reason: Some("end_of_turn".to_string()),
        tool_calls: Vec::new(),
    }
}

fn tool_turn(calls: Vec<ToolCall>) -> AssistantTurn {
    AssistantTurn {
        content: String::new(),
        stop_reason: Some("end_of_turn".to_string()),
        tool_calls: calls,
    }
}

fn color_call(id: &str) -> ToolCall {
    ToolCall::new(
        id,
        "favorite_color_tool",
        json!({"city": "Ottawa", "country": "Canada"}),
    )
}

#[tokio::test]
async fn zero_tool_turn_makes_exactly_one_inference_call() {
    let client = ScriptedClient::new(vec![text_turn("Black is a fine color.")]);
    let mut chat = ConversationLoop::new(Arc::clone(&client), Arc::new(ToolRegistry::new()));

    let answer = chat.ask("What is my favorite color?").await.unwrap();

    assert_eq!(answer, "Black is a fine color.");
    assert_eq!(client.call_count(), 1);
    assert_eq!(chat.history().len(), 2); // user + assistant
}

#[tokio::test]
async fn favorites_scenario_two_turns() {
    let client = ScriptedClient::new(vec![
        tool_turn(vec![color_call("call-1")]),
        text_turn("Your favorite color is black."),
    ]);
    let registry = Arc::new(favorites::demo_registry().unwrap());
    let mut chat = ConversationLoop::new(Arc::clone(&client), registry);

    let answer = chat
        .ask("My city is Ottawa and my country is Canada, what is my favorite color?")
        .await
        .unwrap();

    assert_eq!(answer, "Your favorite color is black.");
    assert_eq!(client.call_count(), 2);

    // user, assistant(tool call), tool result, assistant(answer)
    let history = chat.history();
    assert_eq!(history.len(), 4);
    assert_eq!(history[1].role, Role::Assistant);
    assert_eq!(history[2].role, Role::Tool);
    assert_eq!(history[2].call_id.as_deref(), Some("call-1"));
    assert!(history[2].content.contains("black"));
}

#[tokio::test]
async fn every_tool_call_in_a_turn_is_resolved_before_reinference() {
    let client = ScriptedClient::new(vec![
        tool_turn(vec![
            color_call("call-1"),
            ToolCall::new(
                "call-2",
                "favorite_hockey_tool",
                json!({"city": "Montreal", "country": "Canada"}),
            ),
        ]),
        text_turn("Black, and the Canadiens."),
    ]);
    let registry = Arc::new(favorites::demo_registry().unwrap());
    let mut chat = ConversationLoop::new(Arc::clone(&client), registry);

    chat.ask("Color and hockey team?").await.unwrap();

    // Both tool results land in emitted order before the second call
    let history = chat.history();
    assert_eq!(history[2].tool_name.as_deref(), Some("favorite_color_tool"));
    assert_eq!(history[3].tool_name.as_deref(), Some("favorite_hockey_tool"));

    // Second inference call saw user + assistant + both tool results
    assert_eq!(client.message_counts(), vec![1, 4]);
}

#[tokio::test]
async fn unknown_tool_degrades_to_invalid_tool_message() {
    let client = ScriptedClient::new(vec![
        tool_turn(vec![ToolCall::new("call-1", "no_such_tool", json!({}))]),
        text_turn("I could not use that tool."),
    ]);
    let registry = Arc::new(favorites::demo_registry().unwrap());
    let mut chat = ConversationLoop::new(Arc::clone(&client), registry);

    let answer = chat.ask("Use a tool you do not have").await.unwrap();

    assert_eq!(answer, "I could not use that tool.");
    assert_eq!(chat.history()[2].content, "invalid tool called");
}

#[tokio::test]
async fn failing_tool_is_reported_and_loop_completes() {
    let mut registry = ToolRegistry::new();
    registry
        .register(FunctionTool::new(
            ToolDeclaration::new("broken_tool", "always fails"),
            |_| Err(StackchatError::tool("backend unavailable")),
        ))
        .unwrap();

    let client = ScriptedClient::new(vec![
        tool_turn(vec![ToolCall::new("call-1", "broken_tool", json!({}))]),
        text_turn("The tool is unavailable right now."),
    ]);
    let mut chat = ConversationLoop::new(Arc::clone(&client), Arc::new(registry));

    let answer = chat.ask("Try the broken tool").await.unwrap();

    assert_eq!(answer, "The tool is unavailable right now.");
    assert!(chat.history()[2].content.starts_with("tool call failed: "));
    assert!(chat.history()[2].content.contains("backend unavailable"));
}

#[tokio::test]
async fn exceeding_iteration_bound_fails_with_consistent_history() {
    // The model keeps asking for tools and never answers
    let client = ScriptedClient::new(vec![
        tool_turn(vec![color_call("call-1")]),
        tool_turn(vec![color_call("call-2")]),
        tool_turn(vec![color_call("call-3")]),
    ]);
    let registry = Arc::new(favorites::demo_registry().unwrap());
    let mut chat =
        ConversationLoop::new(Arc::clone(&client), registry).with_max_iterations(2);

    let err = chat.ask("What is my favorite color?").await.unwrap_err();
    assert!(matches!(err, StackchatError::ToolLoopExceeded { limit: 2 }));
    assert_eq!(client.call_count(), 2);

    // History stays inspectable: user, then two full assistant/tool rounds
    let history = chat.history();
    assert_eq!(history.len(), 5);
    assert_eq!(history[0].role, Role::User);
    for round in 0..2 {
        assert_eq!(history[1 + round * 2].role, Role::Assistant);
        assert_eq!(history[2 + round * 2].role, Role::Tool);
    }
}

#[tokio::test]
async fn history_persists_across_questions() {
    let client = ScriptedClient::new(vec![text_turn("first answer"), text_turn("second answer")]);
    let mut chat = ConversationLoop::new(Arc::clone(&client), Arc::new(ToolRegistry::new()))
        .with_system_prompt("Give short answers when possible");

    chat.ask("first question").await.unwrap();
    chat.ask("second question").await.unwrap();

    // system + (user + assistant) * 2
    assert_eq!(chat.history().len(), 5);
    assert_eq!(chat.history()[0].role, Role::System);

    // The second call saw the whole first exchange
    assert_eq!(client.message_counts(), vec![2, 4]);
}

#[tokio::test]
async fn inference_fault_propagates_to_caller() {
    // No scripted turns left: the client fails immediately
    let client = ScriptedClient::new(vec![]);
    let mut chat = ConversationLoop::new(Arc::clone(&client), Arc::new(ToolRegistry::new()));

    let err = chat.ask("hello").await.unwrap_err();
    assert!(matches!(err, StackchatError::Stack(_)));
}
