use crate::conversation::ConversationMessage;
use crate::stream::StreamEvent;
use crate::tool::ToolDefinition;
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send>>;

/// An LLM backend that can be offered tool definitions.
///
/// Defined next to the agentic loop that consumes it; concrete providers
/// live in `itembox-llm`.
#[async_trait]
pub trait ToolAwareLlmProvider: Send + Sync {
    /// Produce one assistant turn as a stream of events.
    async fn stream_with_tools(
        &self,
        messages: Vec<ConversationMessage>,
        system_prompt: Option<String>,
        tools: Vec<ToolDefinition>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<EventStream, LlmError>;

    /// Collect a whole turn into a vector.
    async fn complete_with_tools(
        &self,
        messages: Vec<ConversationMessage>,
        system_prompt: Option<String>,
        tools: Vec<ToolDefinition>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<Vec<StreamEvent>, LlmError> {
        use futures::StreamExt;
        let stream = self
            .stream_with_tools(messages, system_prompt, tools, temperature, max_tokens)
            .await?;
        stream
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .collect::<Result<Vec<_>, _>>()
    }

    /// Provider name for logging (e.g., "groq", "openai", "ollama")
    fn provider_name(&self) -> &str;

    /// Model identifier sent with each request.
    fn model(&self) -> &str;
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
    #[error("Authentication failed")]
    AuthError,
    #[error("Stream error: {0}")]
    StreamError(String),
    #[error("Provider not configured: {0}")]
    NotConfigured(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Scripted provider for exercising the agentic loop without network access.
#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    use super::*;
    use crate::stream::StopReason;
    use futures::stream;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays queued turns in the order they were queued.
    ///
    /// Every request is recorded so tests can inspect what the loop sent.
    #[derive(Default)]
    pub struct MockLlmProvider {
        responses: Mutex<VecDeque<Result<Vec<StreamEvent>, String>>>,
        requests: Mutex<Vec<Vec<ConversationMessage>>>,
    }

    impl MockLlmProvider {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn queue_response(&self, events: Vec<StreamEvent>) {
            self.responses.lock().unwrap().push_back(Ok(events));
        }

        pub fn queue_text(&self, text: &str) {
            self.queue_response(vec![
                StreamEvent::TextDelta {
                    text: text.to_string(),
                },
                StreamEvent::MessageEnd {
                    stop_reason: StopReason::EndTurn,
                },
            ]);
        }

        /// Queue a turn that asks for a single tool call.
        pub fn queue_tool_call(&self, id: &str, name: &str, arguments: serde_json::Value) {
            self.queue_response(vec![
                StreamEvent::ToolCallStart {
                    id: id.to_string(),
                    name: name.to_string(),
                },
                StreamEvent::ToolCallDelta {
                    id: id.to_string(),
                    arguments_delta: arguments.to_string(),
                },
                StreamEvent::ToolCallEnd { id: id.to_string() },
                StreamEvent::MessageEnd {
                    stop_reason: StopReason::ToolUse,
                },
            ]);
        }

        /// Queue a request failure.
        pub fn queue_error(&self, message: &str) {
            self.responses
                .lock()
                .unwrap()
                .push_back(Err(message.to_string()));
        }

        /// Conversation snapshots received so far, one per request.
        pub fn requests(&self) -> Vec<Vec<ConversationMessage>> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ToolAwareLlmProvider for MockLlmProvider {
        async fn stream_with_tools(
            &self,
            messages: Vec<ConversationMessage>,
            _system_prompt: Option<String>,
            _tools: Vec<ToolDefinition>,
            _temperature: f32,
            _max_tokens: u32,
        ) -> Result<EventStream, LlmError> {
            self.requests.lock().unwrap().push(messages);
            let next = self.responses.lock().unwrap().pop_front();
            let events = match next {
                Some(Ok(events)) => events,
                Some(Err(message)) => {
                    return Err(LlmError::ApiError {
                        status: 500,
                        message,
                    })
                }
                None => vec![StreamEvent::MessageEnd {
                    stop_reason: StopReason::EndTurn,
                }],
            };
            Ok(Box::pin(stream::iter(events.into_iter().map(Ok))))
        }

        fn provider_name(&self) -> &str {
            "mock"
        }

        fn model(&self) -> &str {
            "mock-model"
        }
    }
}
