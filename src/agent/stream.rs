//! Streaming turn consumption for server-side agent runs
//!
//! Drains a stream of turn events, accumulating partial text until a
//! terminal event arrives. In-band errors do not discard what was already
//! received: the outcome carries both the partial content and the error.

use futures::{Stream, StreamExt};

use crate::core::StreamEvent;

/// Result of draining one streaming turn
#[derive(Debug, Clone, Default)]
pub struct TurnOutcome {
    /// Accumulated response text (possibly partial on error)
    pub content: String,
    /// Error reported by the stream, if any
    pub error: Option<String>,
}

impl TurnOutcome {
    /// Whether the turn ended with an error
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Callback receiving tool-execution step traces as they arrive
pub type StepObserver = Box<dyn Fn(&serde_json::Value) + Send + Sync>;

/// Consumes streaming turn events into a final outcome
#[derive(Default)]
pub struct StreamingTurnReader {
    step_observer: Option<StepObserver>,
}

impl StreamingTurnReader {
    /// Create a reader with no observer
    pub fn new() -> Self {
        Self::default()
    }

    /// Forward tool-execution step traces to a callback
    pub fn with_step_observer(
        mut self,
        observer: impl Fn(&serde_json::Value) + Send + Sync + 'static,
    ) -> Self {
        self.step_observer = Some(Box::new(observer));
        self
    }

    /// Drain the stream until a terminal event
    ///
    /// Turn updates accumulate into the content buffer; a turn-complete
    /// event appends its final text and stops; an error event (or a
    /// transport fault) stops and records the error alongside whatever
    /// content had accumulated. Tool-execution steps go to the observer
    /// without touching the buffer.
    pub async fn read<S>(&self, mut events: S) -> TurnOutcome
    where
        S: Stream<Item = crate::core::Result<StreamEvent>> + Unpin,
    {
        let mut outcome = TurnOutcome::default();

        while let Some(item) = events.next().await {
            let event = match item {
                Ok(event) => event,
                Err(e) => {
                    outcome.error = Some(e.to_string());
                    return outcome;
                }
            };

            match event {
                StreamEvent::TurnUpdate { text } => outcome.content.push_str(&text),
                StreamEvent::TurnComplete { content } => {
                    outcome.content.push_str(&content);
                    return outcome;
                }
                StreamEvent::Error { message } => {
                    outcome.error = Some(message);
                    return outcome;
                }
                StreamEvent::ToolExecutionStep { details } => {
                    if let Some(observer) = &self.step_observer {
                        observer(&details);
                    }
                }
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StackchatError;
    use std::sync::{Arc, Mutex};

    fn events(items: Vec<StreamEvent>) -> impl Stream<Item = crate::core::Result<StreamEvent>> + Unpin {
        futures::stream::iter(items.into_iter().map(Ok))
    }

    #[tokio::test]
    async fn test_updates_accumulate_until_complete() {
        let reader = StreamingTurnReader::new();
        let outcome = reader
            .read(events(vec![
                StreamEvent::TurnUpdate {
                    text: "a".to_string(),
                },
                StreamEvent::TurnUpdate {
                    text: "b".to_string(),
                },
                StreamEvent::TurnComplete {
                    content: String::new(),
                },
            ]))
            .await;

        assert_eq!(outcome.content, "ab");
        assert!(!outcome.is_error());
    }

    #[tokio::test]
    async fn test_error_with_no_content() {
        let reader = StreamingTurnReader::new();
        let outcome = reader
            .read(events(vec![StreamEvent::Error {
                message: "boom".to_string(),
            }]))
            .await;

        assert_eq!(outcome.content, "");
        assert_eq!(outcome.error.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn test_error_preserves_partial_content() {
        let reader = StreamingTurnReader::new();
        let outcome = reader
            .read(events(vec![
                StreamEvent::TurnUpdate {
                    text: "a".to_string(),
                },
                StreamEvent::Error {
                    message: "boom".to_string(),
                },
            ]))
            .await;

        assert_eq!(outcome.content, "a");
        assert_eq!(outcome.error.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn test_complete_carries_final_text() {
        let reader = StreamingTurnReader::new();
        let outcome = reader
            .read(events(vec![StreamEvent::TurnComplete {
                content: "the answer".to_string(),
            }]))
            .await;

        assert_eq!(outcome.content, "the answer");
    }

    #[tokio::test]
    async fn test_consumption_stops_at_terminal_event() {
        let reader = StreamingTurnReader::new();
        let outcome = reader
            .read(events(vec![
                StreamEvent::TurnComplete {
                    content: "first".to_string(),
                },
                StreamEvent::TurnUpdate {
                    text: "ignored".to_string(),
                },
            ]))
            .await;

        assert_eq!(outcome.content, "first");
    }

    #[tokio::test]
    async fn test_step_observer_receives_traces() {
        let seen: Arc<Mutex<Vec<serde_json::Value>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let reader = StreamingTurnReader::new()
            .with_step_observer(move |details| sink.lock().unwrap().push(details.clone()));

        let outcome = reader
            .read(events(vec![
                StreamEvent::ToolExecutionStep {
                    details: serde_json::json!({"tool": "knowledge_search"}),
                },
                StreamEvent::TurnComplete {
                    content: "done".to_string(),
                },
            ]))
            .await;

        assert_eq!(outcome.content, "done");
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0]["tool"], "knowledge_search");
    }

    #[tokio::test]
    async fn test_transport_fault_surfaces_with_partial_content() {
        let reader = StreamingTurnReader::new();
        let items: Vec<crate::core::Result<StreamEvent>> = vec![
            Ok(StreamEvent::TurnUpdate {
                text: "partial".to_string(),
            }),
            Err(StackchatError::stream("connection reset")),
        ];

        let outcome = reader.read(futures::stream::iter(items)).await;
        assert_eq!(outcome.content, "partial");
        assert!(outcome.error.as_deref().unwrap().contains("connection reset"));
    }
}
