//! Tool invocation - turns one model-requested call into a tool message
//!
//! Failures never propagate out of here: an unknown tool name or a failing
//! executable degrades the single turn by reporting the problem back to the
//! model as a tool result, leaving the rest of the conversation intact.

use crate::core::{Message, ToolCall};
use crate::tools::ToolRegistry;

/// Fixed content returned for a tool name the registry does not know
pub const INVALID_TOOL_MESSAGE: &str = "invalid tool called";

/// Invoke one tool call against the registry
///
/// Always produces a tool-role message correlated by the request's call id:
/// the tool's output on success, the fixed marker for unknown names, or
/// `tool call failed: <detail>` when the executable errors.
pub async fn invoke(call: &ToolCall, registry: &ToolRegistry) -> Message {
    let Some(tool) = registry.resolve(&call.tool_name) else {
        return Message::tool(&call.call_id, &call.tool_name, INVALID_TOOL_MESSAGE);
    };

    match tool.invoke(&call.arguments).await {
        Ok(output) => Message::tool(&call.call_id, &call.tool_name, output),
        Err(e) => Message::tool(
            &call.call_id,
            &call.tool_name,
            format!("tool call failed: {}", e),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Role, StackchatError, ToolDeclaration};
    use crate::tools::FunctionTool;
    use serde_json::json;

    fn registry_with(name: &str, result: crate::core::Result<String>) -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        let outcome = std::sync::Mutex::new(Some(result));
        registry
            .register(FunctionTool::new(
                ToolDeclaration::new(name, "a test tool"),
                move |_| outcome.lock().unwrap().take().unwrap(),
            ))
            .unwrap();
        registry
    }

    #[tokio::test]
    async fn test_unknown_tool_yields_fixed_marker() {
        let registry = ToolRegistry::new();
        let call = ToolCall::new("call-1", "no_such_tool", json!({}));

        let message = invoke(&call, &registry).await;
        assert_eq!(message.role, Role::Tool);
        assert_eq!(message.content, INVALID_TOOL_MESSAGE);
        assert_eq!(message.call_id.as_deref(), Some("call-1"));
        assert_eq!(message.tool_name.as_deref(), Some("no_such_tool"));
    }

    #[tokio::test]
    async fn test_successful_tool_output_becomes_content() {
        let registry = registry_with("echo_tool", Ok("the output".to_string()));
        let call = ToolCall::new("call-2", "echo_tool", json!({}));

        let message = invoke(&call, &registry).await;
        assert_eq!(message.content, "the output");
    }

    #[tokio::test]
    async fn test_failing_tool_becomes_failure_message() {
        let registry = registry_with(
            "broken_tool",
            Err(StackchatError::tool("missing argument 'city'")),
        );
        let call = ToolCall::new("call-3", "broken_tool", json!({}));

        let message = invoke(&call, &registry).await;
        assert!(message.content.starts_with("tool call failed: "));
        assert!(message.content.contains("missing argument 'city'"));
    }
}
