//! Stack server client
//!
//! Async HTTP client for a Llama Stack server: chat completion with tool
//! declarations, model/shield/vector-db/toolgroup registration, safety
//! shields, the RAG tool runtime, and streaming agent turns.

use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use url::Url;

use crate::client::traits::InferenceClient;
use crate::core::{
    AssistantTurn, Config, Message, Result, StackchatError, StreamEvent, ToolCall, ToolDeclaration,
};

/// Stack API client
#[derive(Clone)]
pub struct StackClient {
    client: Client,
    base_url: String,
    model_id: String,
    verbose: bool,
}

/// Chat completion request
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model_id: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolDeclaration]>,
}

/// Chat completion response
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    completion_message: WireCompletionMessage,
}

/// Completion message as the server sends it
#[derive(Debug, Deserialize)]
struct WireCompletionMessage {
    #[serde(default)]
    content: serde_json::Value,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Debug, Deserialize)]
struct WireToolCall {
    #[serde(default)]
    call_id: Option<String>,
    tool_name: String,
    #[serde(default)]
    arguments: serde_json::Value,
}

/// Result of running a safety shield over messages
#[derive(Debug, Deserialize)]
pub struct ShieldResult {
    /// Present when the shield flagged the content
    #[serde(default)]
    pub violation: Option<ShieldViolation>,
}

/// A violation reported by a safety shield
#[derive(Debug, Clone, Deserialize)]
pub struct ShieldViolation {
    #[serde(default)]
    pub violation_level: Option<String>,
    #[serde(default)]
    pub user_message: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// A provider advertised by the stack
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderInfo {
    pub api: String,
    pub provider_id: String,
}

/// A document for RAG ingestion
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub document_id: String,
    pub content: String,
    pub mime_type: String,
    pub metadata: serde_json::Value,
}

/// Server-side agent configuration
#[derive(Debug, Clone, Serialize)]
pub struct AgentConfig {
    pub model: String,
    pub instructions: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub toolgroups: Vec<Toolgroup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<String>,
    pub input_shields: Vec<String>,
    pub output_shields: Vec<String>,
    pub max_infer_iters: usize,
}

/// A toolgroup reference in an agent configuration
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Toolgroup {
    /// Reference by name only
    Name(String),
    /// Reference with provider arguments, e.g. RAG vector db ids
    WithArgs {
        name: String,
        args: serde_json::Value,
    },
}

impl AgentConfig {
    /// Create an agent configuration with no toolgroups or shields
    pub fn new(model: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            instructions: instructions.into(),
            toolgroups: Vec::new(),
            tool_choice: None,
            input_shields: Vec::new(),
            output_shields: Vec::new(),
            max_infer_iters: 10,
        }
    }

    /// Add a toolgroup by name
    pub fn with_toolgroup(mut self, name: impl Into<String>) -> Self {
        self.toolgroups.push(Toolgroup::Name(name.into()));
        self.tool_choice = Some("auto".to_string());
        self
    }

    /// Add a toolgroup with provider arguments
    pub fn with_toolgroup_args(
        mut self,
        name: impl Into<String>,
        args: serde_json::Value,
    ) -> Self {
        self.toolgroups.push(Toolgroup::WithArgs {
            name: name.into(),
            args,
        });
        self.tool_choice = Some("auto".to_string());
        self
    }

    /// Set the input and output shields
    pub fn with_shields(mut self, input: Vec<String>, output: Vec<String>) -> Self {
        self.input_shields = input;
        self.output_shields = output;
        self
    }

    /// Set the server-side inference iteration bound
    pub fn with_max_infer_iters(mut self, max: usize) -> Self {
        self.max_infer_iters = max;
        self
    }
}

/// A stream of turn events from a server-side agent
pub type TurnStream = Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>;

impl StackClient {
    /// Create a client from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let base_url = config.stack_url();
        Url::parse(&base_url)
            .map_err(|e| StackchatError::config(format!("Invalid stack URL '{}': {}", base_url, e)))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.stack.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url,
            model_id: config.model.id.clone(),
            verbose: config.chat.verbose,
        })
    }

    /// Create a client with a custom base URL and default timeout
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Url::parse(&base_url)
            .map_err(|e| StackchatError::config(format!("Invalid stack URL '{}': {}", base_url, e)))?;

        let client = Client::builder().timeout(Duration::from_secs(120)).build()?;

        Ok(Self {
            client,
            base_url,
            model_id: String::new(),
            verbose: false,
        })
    }

    /// The model id used for chat completion
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Debug print if enabled
    fn debug_print(&self, label: &str, content: &str) {
        if self.verbose {
            if content.len() > 500 {
                eprintln!("DEBUG {}: {}...", label, &content[..500]);
            } else {
                eprintln!("DEBUG {}: {}", label, content);
            }
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a POST, mapping connection and status failures to stack errors
    async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(self.endpoint(path))
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        self.check_status(response).await
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response> {
        let response = self
            .client
            .get(self.endpoint(path))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        self.check_status(response).await
    }

    async fn delete(&self, path: &str) -> Result<reqwest::Response> {
        let response = self
            .client
            .delete(self.endpoint(path))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        self.check_status(response).await
    }

    fn map_send_error(&self, e: reqwest::Error) -> StackchatError {
        if e.is_connect() {
            StackchatError::stack(format!(
                "Cannot connect to the stack at {}. Is it running?",
                self.base_url
            ))
        } else {
            StackchatError::from(e)
        }
    }

    async fn check_status(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(StackchatError::stack(format!(
                "stack API error ({}): {}",
                status, error_text
            )));
        }
        Ok(response)
    }

    /// Register a model with the stack
    pub async fn register_model(
        &self,
        model_id: &str,
        provider_id: &str,
        provider_model_id: &str,
    ) -> Result<()> {
        self.post(
            "/v1/models",
            &json!({
                "model_id": model_id,
                "provider_id": provider_id,
                "provider_model_id": provider_model_id,
                "model_type": "llm",
            }),
        )
        .await?;
        Ok(())
    }

    /// Register a safety shield
    pub async fn register_shield(
        &self,
        shield_id: &str,
        provider_id: &str,
        provider_shield_id: &str,
    ) -> Result<()> {
        self.post(
            "/v1/shields",
            &json!({
                "shield_id": shield_id,
                "provider_id": provider_id,
                "provider_shield_id": provider_shield_id,
            }),
        )
        .await?;
        Ok(())
    }

    /// Run a shield over messages
    pub async fn run_shield(&self, shield_id: &str, messages: &[Message]) -> Result<ShieldResult> {
        let response = self
            .post(
                "/v1/safety/run-shield",
                &json!({
                    "shield_id": shield_id,
                    "messages": messages,
                    "params": {},
                }),
            )
            .await?;

        Ok(response.json().await?)
    }

    /// List the providers the stack serves
    pub async fn list_providers(&self) -> Result<Vec<ProviderInfo>> {
        let response = self.get("/v1/providers").await?;
        let value: serde_json::Value = response.json().await?;

        // Either a bare list or wrapped in a "data" field
        let list = match &value {
            serde_json::Value::Array(_) => value.clone(),
            _ => value.get("data").cloned().unwrap_or(json!([])),
        };

        Ok(serde_json::from_value(list)?)
    }

    /// Register a vector database
    pub async fn register_vector_db(
        &self,
        vector_db_id: &str,
        provider_id: &str,
        embedding_model: &str,
        embedding_dimension: u32,
    ) -> Result<()> {
        self.post(
            "/v1/vector-dbs",
            &json!({
                "vector_db_id": vector_db_id,
                "provider_id": provider_id,
                "embedding_model": embedding_model,
                "embedding_dimension": embedding_dimension,
            }),
        )
        .await?;
        Ok(())
    }

    /// Remove a vector database
    pub async fn unregister_vector_db(&self, vector_db_id: &str) -> Result<()> {
        self.delete(&format!("/v1/vector-dbs/{}", vector_db_id))
            .await?;
        Ok(())
    }

    /// Register an MCP toolgroup reachable at the given endpoint
    pub async fn register_toolgroup(&self, toolgroup_id: &str, mcp_uri: &str) -> Result<()> {
        self.post(
            "/v1/toolgroups",
            &json!({
                "toolgroup_id": toolgroup_id,
                "provider_id": "model-context-protocol",
                "mcp_endpoint": { "uri": mcp_uri },
            }),
        )
        .await?;
        Ok(())
    }

    /// Insert documents into a vector database with server-side chunking
    pub async fn rag_insert(
        &self,
        documents: &[Document],
        vector_db_id: &str,
        chunk_size_in_tokens: u32,
    ) -> Result<()> {
        self.post(
            "/v1/tool-runtime/rag-tool/insert",
            &json!({
                "documents": documents,
                "vector_db_id": vector_db_id,
                "chunk_size_in_tokens": chunk_size_in_tokens,
            }),
        )
        .await?;
        Ok(())
    }

    /// Query vector databases, returning the retrieved chunk texts
    pub async fn rag_query(&self, content: &str, vector_db_ids: &[String]) -> Result<Vec<String>> {
        let response = self
            .post(
                "/v1/tool-runtime/rag-tool/query",
                &json!({
                    "content": content,
                    "vector_db_ids": vector_db_ids,
                }),
            )
            .await?;

        let value: serde_json::Value = response.json().await?;
        Ok(extract_text_items(value.get("content")))
    }

    /// Create a server-side agent, returning its id
    pub async fn create_agent(&self, agent_config: &AgentConfig) -> Result<String> {
        let response = self
            .post("/v1/agents", &json!({ "agent_config": agent_config }))
            .await?;

        let value: serde_json::Value = response.json().await?;
        value
            .get("agent_id")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| StackchatError::stack("agent creation response had no agent_id"))
    }

    /// Create a session for an agent, returning its id
    pub async fn create_session(&self, agent_id: &str, session_name: &str) -> Result<String> {
        let response = self
            .post(
                &format!("/v1/agents/{}/session", agent_id),
                &json!({ "session_name": session_name }),
            )
            .await?;

        let value: serde_json::Value = response.json().await?;
        value
            .get("session_id")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| StackchatError::stack("session creation response had no session_id"))
    }

    /// Start a streaming agent turn
    ///
    /// The returned stream yields parsed [`StreamEvent`]s in arrival order;
    /// SSE payloads that carry nothing we understand are skipped.
    pub async fn create_turn_stream(
        &self,
        agent_id: &str,
        session_id: &str,
        messages: &[Message],
    ) -> Result<TurnStream> {
        self.debug_print("Turn request", &format!("{} messages", messages.len()));

        let response = self
            .post(
                &format!("/v1/agents/{}/session/{}/turn", agent_id, session_id),
                &json!({
                    "messages": messages,
                    "stream": true,
                }),
            )
            .await?;

        let bytes = response
            .bytes_stream()
            .map(|chunk| chunk.map(|b| b.to_vec()))
            .boxed();

        let stream = futures::stream::unfold(SseDecoder::new(bytes), |mut decoder| async move {
            decoder.next_event().await.map(|item| (item, decoder))
        });

        Ok(Box::pin(stream))
    }
}

#[async_trait]
impl InferenceClient for StackClient {
    async fn chat_completion(
        &self,
        messages: &[Message],
        tools: &[ToolDeclaration],
    ) -> Result<AssistantTurn> {
        let request = ChatCompletionRequest {
            model_id: &self.model_id,
            messages,
            tools: if tools.is_empty() { None } else { Some(tools) },
        };

        let request_json = serde_json::to_string(&request)?;
        self.debug_print("Request", &request_json);

        let response = self.post("/v1/inference/chat-completion", &request).await?;

        let response_text = response.text().await?;
        self.debug_print("Response", &response_text);

        let chat_response: ChatCompletionResponse = serde_json::from_str(&response_text)
            .map_err(|e| StackchatError::stack(format!("Failed to parse response: {}", e)))?;

        Ok(to_assistant_turn(chat_response.completion_message))
    }
}

/// Convert the wire completion message into an [`AssistantTurn`]
fn to_assistant_turn(message: WireCompletionMessage) -> AssistantTurn {
    let tool_calls = message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|tc| ToolCall {
            call_id: tc.call_id.unwrap_or_default(),
            tool_name: tc.tool_name,
            arguments: normalize_arguments(tc.arguments),
        })
        .collect();

    AssistantTurn {
        content: flatten_content(&message.content),
        stop_reason: message.stop_reason,
        tool_calls,
    }
}

/// Some providers send arguments as a JSON-encoded string
fn normalize_arguments(value: serde_json::Value) -> serde_json::Value {
    if let serde_json::Value::String(s) = &value {
        if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(s) {
            return parsed;
        }
    }
    value
}

/// Flatten server content (plain string or a list of text items) into text
fn flatten_content(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(items) => items
            .iter()
            .map(|item| match item {
                serde_json::Value::String(s) => s.clone(),
                other => other
                    .get("text")
                    .and_then(|t| t.as_str())
                    .unwrap_or_default()
                    .to_string(),
            })
            .collect::<Vec<_>>()
            .join(""),
        other => other
            .get("text")
            .and_then(|t| t.as_str())
            .unwrap_or_default()
            .to_string(),
    }
}

/// Extract the `text` of each content item from a RAG/tool response
pub(crate) fn extract_text_items(content: Option<&serde_json::Value>) -> Vec<String> {
    match content {
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                serde_json::Value::String(s) => Some(s.clone()),
                other => other
                    .get("text")
                    .and_then(|t| t.as_str())
                    .map(|s| s.to_string()),
            })
            .collect(),
        Some(serde_json::Value::String(s)) => vec![s.clone()],
        _ => Vec::new(),
    }
}

/// Incremental decoder turning SSE bytes into stream events
struct SseDecoder {
    bytes: BoxStream<'static, reqwest::Result<Vec<u8>>>,
    buffer: String,
    queued: VecDeque<StreamEvent>,
    done: bool,
}

impl SseDecoder {
    fn new(bytes: BoxStream<'static, reqwest::Result<Vec<u8>>>) -> Self {
        Self {
            bytes,
            buffer: String::new(),
            queued: VecDeque::new(),
            done: false,
        }
    }

    async fn next_event(&mut self) -> Option<Result<StreamEvent>> {
        loop {
            if let Some(event) = self.queued.pop_front() {
                return Some(Ok(event));
            }
            if self.done {
                return None;
            }

            match self.bytes.next().await {
                Some(Ok(chunk)) => {
                    self.buffer.push_str(&String::from_utf8_lossy(&chunk));
                    self.drain_lines();
                }
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(StackchatError::stream(e.to_string())));
                }
                None => {
                    self.done = true;
                    // A final line may arrive without a trailing newline
                    let rest = std::mem::take(&mut self.buffer);
                    self.parse_line(rest.trim());
                }
            }
        }
    }

    fn drain_lines(&mut self) {
        while let Some(pos) = self.buffer.find('\n') {
            let line = self.buffer[..pos].trim().to_string();
            self.buffer = self.buffer[pos + 1..].to_string();
            self.parse_line(&line);
        }
    }

    fn parse_line(&mut self, line: &str) {
        if line.is_empty() {
            return;
        }
        if let Some(payload) = line.strip_prefix("data:") {
            let payload = payload.trim();
            if payload == "[DONE]" {
                return;
            }
            if let Some(event) = StreamEvent::from_sse_payload(payload) {
                self.queued.push_back(event);
            }
        }
    }
}
