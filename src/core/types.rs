//! Shared types used across stackchat modules
//!
//! Contains conversation messages, tool declarations, tool calls, and the
//! stream events emitted by server-side agent turns.

use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Deserialize, Serialize, Serializer};

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Tool => write!(f, "tool"),
        }
    }
}

/// A message in a conversation
///
/// History is append-only: once a message is in a conversation it is never
/// mutated, and insertion order is the causal order the server sees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender
    pub role: Role,
    /// Content of the message
    pub content: String,
    /// Stop reason reported for assistant turns
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
    /// Tool calls requested by the assistant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    /// Call id this tool result answers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,
    /// Tool that produced this result
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
}

impl Message {
    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            stop_reason: None,
            tool_calls: None,
            call_id: None,
            tool_name: None,
        }
    }

    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            stop_reason: None,
            tool_calls: None,
            call_id: None,
            tool_name: None,
        }
    }

    /// Create a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            stop_reason: None,
            tool_calls: None,
            call_id: None,
            tool_name: None,
        }
    }

    /// Create a tool-result message correlated to a tool call
    pub fn tool(
        call_id: impl Into<String>,
        tool_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            stop_reason: None,
            tool_calls: None,
            call_id: Some(call_id.into()),
            tool_name: Some(tool_name.into()),
        }
    }
}

/// A tool invocation requested by the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Identifier correlating the eventual result back to this request
    pub call_id: String,
    /// Name of the tool to invoke
    pub tool_name: String,
    /// Argument mapping supplied by the model
    #[serde(default)]
    pub arguments: serde_json::Value,
}

impl ToolCall {
    /// Create a new tool call
    pub fn new(
        call_id: impl Into<String>,
        tool_name: impl Into<String>,
        arguments: serde_json::Value,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            arguments,
        }
    }

    /// Get a string argument by key
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.arguments
            .get(key)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }
}

/// One parameter of a tool declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolParameter {
    /// Parameter name (the key in the wire mapping)
    pub name: String,
    /// Type tag, e.g. "string"
    pub param_type: String,
    /// Human-readable description
    pub description: String,
    /// Whether the model must supply this parameter
    pub required: bool,
}

/// Declaration of a tool advertised to the model
///
/// Declarations are built once before a conversation loop starts and passed
/// unchanged to every inference call, so the model sees a consistent tool
/// surface. Parameters keep their declared order on the wire.
#[derive(Debug, Clone)]
pub struct ToolDeclaration {
    /// Tool name, unique within a registry
    pub tool_name: String,
    /// What the tool does
    pub description: String,
    /// Ordered parameter list
    pub parameters: Vec<ToolParameter>,
}

impl ToolDeclaration {
    /// Create a declaration with no parameters
    pub fn new(tool_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    /// Append a parameter, preserving declaration order
    pub fn with_param(
        mut self,
        name: impl Into<String>,
        param_type: impl Into<String>,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        self.parameters.push(ToolParameter {
            name: name.into(),
            param_type: param_type.into(),
            description: description.into(),
            required,
        });
        self
    }
}

// The stack expects `parameters` as a JSON object keyed by parameter name.
// Serialized by hand so the emitted key order matches declaration order.
impl Serialize for ToolDeclaration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        struct Params<'a>(&'a [ToolParameter]);

        struct ParamValue<'a>(&'a ToolParameter);

        impl Serialize for ParamValue<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("param_type", &self.0.param_type)?;
                map.serialize_entry("description", &self.0.description)?;
                map.serialize_entry("required", &self.0.required)?;
                map.end()
            }
        }

        impl Serialize for Params<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut map = serializer.serialize_map(Some(self.0.len()))?;
                for param in self.0 {
                    map.serialize_entry(&param.name, &ParamValue(param))?;
                }
                map.end()
            }
        }

        let mut state = serializer.serialize_struct("ToolDeclaration", 3)?;
        state.serialize_field("tool_name", &self.tool_name)?;
        state.serialize_field("description", &self.description)?;
        state.serialize_field("parameters", &Params(&self.parameters))?;
        state.end()
    }
}

/// One assistant turn returned by an inference call
#[derive(Debug, Clone)]
pub struct AssistantTurn {
    /// Text content of the turn
    pub content: String,
    /// Stop reason reported by the server, if any
    pub stop_reason: Option<String>,
    /// Tool invocations the model requested, in emitted order
    pub tool_calls: Vec<ToolCall>,
}

impl AssistantTurn {
    /// Whether this turn requests any tool invocations
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Convert into an assistant message for the history
    pub fn into_message(self) -> Message {
        Message {
            role: Role::Assistant,
            content: self.content,
            stop_reason: self.stop_reason,
            tool_calls: if self.tool_calls.is_empty() {
                None
            } else {
                Some(self.tool_calls)
            },
            call_id: None,
            tool_name: None,
        }
    }
}

/// One event from a streaming agent turn
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// Server reported an error; consumption stops
    Error { message: String },
    /// Partial response text
    TurnUpdate { text: String },
    /// Terminal event carrying the turn's final text
    TurnComplete { content: String },
    /// A tool execution step finished; structured trace for observers
    ToolExecutionStep { details: serde_json::Value },
}

/// Raw shape of one SSE payload from the agent turn endpoint.
///
/// Everything is optional on the wire; chunks that carry nothing we
/// understand are skipped rather than treated as failures.
#[derive(Debug, Deserialize)]
struct RawTurnChunk {
    #[serde(default)]
    error: Option<RawError>,
    #[serde(default)]
    event: Option<RawEvent>,
}

#[derive(Debug, Deserialize)]
struct RawError {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(default)]
    payload: Option<RawPayload>,
}

#[derive(Debug, Deserialize)]
struct RawPayload {
    #[serde(default)]
    event_type: Option<String>,
    #[serde(default)]
    step_type: Option<String>,
    #[serde(default)]
    delta: Option<RawDelta>,
    #[serde(default)]
    turn: Option<RawTurn>,
    #[serde(default)]
    step_details: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawDelta {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawTurn {
    #[serde(default)]
    output_message: Option<RawOutputMessage>,
}

#[derive(Debug, Deserialize)]
struct RawOutputMessage {
    #[serde(default)]
    content: Option<String>,
}

impl StreamEvent {
    /// Parse one SSE `data:` payload into a stream event.
    ///
    /// Returns `None` for payloads that are not valid JSON, carry no
    /// recognized event type, or are missing the fields their type needs.
    pub fn from_sse_payload(payload: &str) -> Option<Self> {
        let chunk: RawTurnChunk = serde_json::from_str(payload).ok()?;

        if let Some(error) = chunk.error {
            return Some(StreamEvent::Error {
                message: error.message.unwrap_or_else(|| "Unknown error".to_string()),
            });
        }

        let payload = chunk.event?.payload?;
        match payload.event_type.as_deref() {
            Some("turn_complete") => {
                let content = payload.turn?.output_message?.content?;
                Some(StreamEvent::TurnComplete { content })
            }
            Some("step_progress") => {
                let text = payload.delta?.text?;
                Some(StreamEvent::TurnUpdate { text })
            }
            Some("step_complete") if payload.step_type.as_deref() == Some("tool_execution") => {
                let details = payload.step_details?;
                Some(StreamEvent::ToolExecutionStep { details })
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_constructors() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello");
        assert!(msg.tool_calls.is_none());

        let tool = Message::tool("call-1", "favorite_color_tool", "black");
        assert_eq!(tool.role, Role::Tool);
        assert_eq!(tool.call_id.as_deref(), Some("call-1"));
        assert_eq!(tool.tool_name.as_deref(), Some("favorite_color_tool"));
    }

    #[test]
    fn test_tool_message_wire_shape() {
        let msg = Message::tool("abc", "favorite_color_tool", "black");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            value,
            json!({
                "role": "tool",
                "content": "black",
                "call_id": "abc",
                "tool_name": "favorite_color_tool",
            })
        );
    }

    #[test]
    fn test_declaration_preserves_parameter_order() {
        let decl = ToolDeclaration::new("favorite_color_tool", "returns the favorite color")
            .with_param("city", "string", "the city for the person", true)
            .with_param("country", "string", "the country for the person", true);

        let text = serde_json::to_string(&decl).unwrap();
        let city = text.find("\"city\"").unwrap();
        let country = text.find("\"country\"").unwrap();
        assert!(city < country);

        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["parameters"]["city"]["param_type"], "string");
        assert_eq!(value["parameters"]["country"]["required"], true);
    }

    #[test]
    fn test_assistant_turn_into_message() {
        let turn = AssistantTurn {
            content: "done".to_string(),
            stop_reason: Some("end_of_turn".to_string()),
            tool_calls: Vec::new(),
        };
        let msg = turn.into_message();
        assert_eq!(msg.role, Role::Assistant);
        assert!(msg.tool_calls.is_none());

        let turn = AssistantTurn {
            content: String::new(),
            stop_reason: None,
            tool_calls: vec![ToolCall::new("c1", "favorite_color_tool", json!({}))],
        };
        let msg = turn.into_message();
        assert_eq!(msg.tool_calls.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn test_stream_event_turn_complete() {
        let payload = json!({
            "event": {
                "payload": {
                    "event_type": "turn_complete",
                    "turn": { "output_message": { "content": "the answer" } }
                }
            }
        })
        .to_string();

        match StreamEvent::from_sse_payload(&payload) {
            Some(StreamEvent::TurnComplete { content }) => assert_eq!(content, "the answer"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_stream_event_error() {
        let payload = json!({ "error": { "message": "boom" } }).to_string();
        match StreamEvent::from_sse_payload(&payload) {
            Some(StreamEvent::Error { message }) => assert_eq!(message, "boom"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_stream_event_skips_incomplete_payloads() {
        // Payload with no event body at all
        assert!(StreamEvent::from_sse_payload("{}").is_none());
        // Event with a missing payload field
        let payload = json!({ "event": {} }).to_string();
        assert!(StreamEvent::from_sse_payload(&payload).is_none());
        // Unknown event type
        let payload = json!({
            "event": { "payload": { "event_type": "session_started" } }
        })
        .to_string();
        assert!(StreamEvent::from_sse_payload(&payload).is_none());
        // Not JSON
        assert!(StreamEvent::from_sse_payload("not json").is_none());
    }

    #[test]
    fn test_stream_event_tool_execution_step() {
        let payload = json!({
            "event": {
                "payload": {
                    "event_type": "step_complete",
                    "step_type": "tool_execution",
                    "step_details": { "tool_responses": [] }
                }
            }
        })
        .to_string();

        match StreamEvent::from_sse_payload(&payload) {
            Some(StreamEvent::ToolExecutionStep { details }) => {
                assert!(details.get("tool_responses").is_some())
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
