//! MCP client session - tools served by a local child process
//!
//! Speaks line-delimited JSON-RPC 2.0 over the server's stdin/stdout. The
//! drivers use it strictly sequentially: one request in flight at a time,
//! responses matched by id, server-initiated messages skipped.

use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;

use crate::core::{Result, StackchatError, ToolDeclaration};
use crate::tools::{Tool, ToolRegistry};

const PROTOCOL_VERSION: &str = "2025-06-18";

/// A connection to a local MCP tool server
pub struct McpSession {
    inner: Mutex<SessionInner>,
    server_name: String,
}

struct SessionInner {
    child: Child,
    writer: BufWriter<ChildStdin>,
    lines: Lines<BufReader<ChildStdout>>,
    next_id: u64,
}

impl McpSession {
    /// Spawn the server command and run the initialize handshake
    pub async fn connect(command: &str, args: &[String]) -> Result<Self> {
        let mut child = Command::new(command)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| StackchatError::mcp(format!("failed to spawn '{}': {}", command, e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| StackchatError::mcp("failed to capture server stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| StackchatError::mcp("failed to capture server stdout"))?;

        let session = Self {
            inner: Mutex::new(SessionInner {
                child,
                writer: BufWriter::new(stdin),
                lines: BufReader::new(stdout).lines(),
                next_id: 1,
            }),
            server_name: command.to_string(),
        };

        session.initialize().await?;
        Ok(session)
    }

    async fn initialize(&self) -> Result<()> {
        self.request(
            "initialize",
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "clientInfo": {
                    "name": env!("CARGO_PKG_NAME"),
                    "version": env!("CARGO_PKG_VERSION"),
                },
                "capabilities": {},
            }),
        )
        .await?;

        self.notify("notifications/initialized", json!({})).await
    }

    /// List the server's tools as declarations for the model
    pub async fn list_tools(&self) -> Result<Vec<ToolDeclaration>> {
        let result = self.request("tools/list", json!({})).await?;

        let tools = result
            .get("tools")
            .and_then(Value::as_array)
            .ok_or_else(|| StackchatError::mcp("tools/list response had no tools array"))?;

        Ok(tools.iter().filter_map(declaration_from_tool).collect())
    }

    /// Call a tool on the server, returning its text output
    pub async fn call_tool(&self, name: &str, arguments: &Value) -> Result<String> {
        let arguments = match arguments {
            Value::Null => json!({}),
            other => other.clone(),
        };

        let result = self
            .request("tools/call", json!({ "name": name, "arguments": arguments }))
            .await?;

        let text = crate::client::stack::extract_text_items(result.get("content")).join("\n");
        if result.get("isError").and_then(Value::as_bool) == Some(true) {
            return Err(StackchatError::mcp(text));
        }
        Ok(text)
    }

    /// Kill the server process
    pub async fn shutdown(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.child.kill().await.ok();
        inner.child.wait().await?;
        Ok(())
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let mut inner = self.inner.lock().await;

        let id = inner.next_id;
        inner.next_id += 1;

        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        Self::write_line(&mut inner.writer, &payload).await?;

        // Read until the matching response; skip notifications and anything
        // else the server sends in between
        loop {
            let line = inner
                .lines
                .next_line()
                .await
                .map_err(|e| StackchatError::mcp(format!("read from {}: {}", self.server_name, e)))?
                .ok_or_else(|| {
                    StackchatError::mcp(format!("{} closed the connection", self.server_name))
                })?;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let Ok(value) = serde_json::from_str::<Value>(trimmed) else {
                continue;
            };
            if value.get("id").and_then(Value::as_u64) != Some(id) {
                continue;
            }

            if let Some(error) = value.get("error") {
                let message = error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error");
                return Err(StackchatError::mcp(format!(
                    "{} ({})",
                    message,
                    error.get("code").and_then(Value::as_i64).unwrap_or(-32000)
                )));
            }

            return Ok(value.get("result").cloned().unwrap_or(Value::Null));
        }
    }

    async fn notify(&self, method: &str, params: Value) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let payload = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
        });
        Self::write_line(&mut inner.writer, &payload).await
    }

    async fn write_line(writer: &mut BufWriter<ChildStdin>, payload: &Value) -> Result<()> {
        let mut encoded = serde_json::to_vec(payload)?;
        encoded.push(b'\n');
        writer.write_all(&encoded).await?;
        writer.flush().await?;
        Ok(())
    }
}

/// Convert one entry of a `tools/list` response into a declaration
fn declaration_from_tool(tool: &Value) -> Option<ToolDeclaration> {
    let name = tool.get("name").and_then(Value::as_str)?;
    let description = tool
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let mut declaration = ToolDeclaration::new(name, description);

    if let Some(schema) = tool.get("inputSchema") {
        let required: Vec<&str> = schema
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
            for (param_name, parameter) in properties {
                let param_type = parameter
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or("string");
                let param_description = parameter
                    .get("description")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                declaration = declaration.with_param(
                    param_name.as_str(),
                    param_type,
                    param_description,
                    required.contains(&param_name.as_str()),
                );
            }
        }
    }

    Some(declaration)
}

/// A tool served by a remote MCP session
pub struct McpTool {
    session: Arc<McpSession>,
    declaration: ToolDeclaration,
}

impl McpTool {
    pub fn new(session: Arc<McpSession>, declaration: ToolDeclaration) -> Self {
        Self {
            session,
            declaration,
        }
    }
}

#[async_trait]
impl Tool for McpTool {
    fn declaration(&self) -> &ToolDeclaration {
        &self.declaration
    }

    async fn invoke(&self, arguments: &serde_json::Value) -> Result<String> {
        self.session
            .call_tool(&self.declaration.tool_name, arguments)
            .await
    }
}

/// Build a registry exposing every tool the session serves
pub async fn registry_from_session(session: &Arc<McpSession>) -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    for declaration in session.list_tools().await? {
        registry.register_arc(Arc::new(McpTool::new(Arc::clone(session), declaration)))?;
    }
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declaration_from_tool_json() {
        let tool = json!({
            "name": "favorite_color_tool",
            "description": "Returns the favorite color for person given their City and Country.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "city": { "type": "string", "description": "the city for the person" },
                    "country": { "type": "string", "description": "the country for the person" }
                },
                "required": ["city", "country"]
            }
        });

        let declaration = declaration_from_tool(&tool).unwrap();
        assert_eq!(declaration.tool_name, "favorite_color_tool");
        assert_eq!(declaration.parameters.len(), 2);
        assert!(declaration.parameters.iter().all(|p| p.required));
        assert!(declaration
            .parameters
            .iter()
            .any(|p| p.name == "city" && p.param_type == "string"));
    }

    #[test]
    fn test_declaration_from_tool_without_schema() {
        let tool = json!({ "name": "ping_tool" });
        let declaration = declaration_from_tool(&tool).unwrap();
        assert!(declaration.parameters.is_empty());

        // Entries without a name are skipped
        assert!(declaration_from_tool(&json!({ "description": "nameless" })).is_none());
    }
}
