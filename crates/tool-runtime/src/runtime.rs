use crate::conversation::{AssistantContent, Conversation};
use crate::provider::{LlmError, ToolAwareLlmProvider};
use crate::registry::ToolRegistry;
use crate::stream::{StopReason, StreamEvent};
use crate::tool::{ToolCall, ToolResult};
use futures::StreamExt;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Drives one user turn: LLM → tool calls → results → LLM → ... → final text.
pub struct AgenticLoop {
    provider: Arc<dyn ToolAwareLlmProvider>,
    registry: Arc<ToolRegistry>,
    max_iterations: usize,
    temperature: f32,
    max_tokens: u32,
}

impl AgenticLoop {
    pub fn new(provider: Arc<dyn ToolAwareLlmProvider>, registry: Arc<ToolRegistry>) -> Self {
        Self {
            provider,
            registry,
            max_iterations: 10,
            temperature: 0.0,
            max_tokens: 4096,
        }
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = temp;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = max;
        self
    }

    /// Run a single user turn, appending everything to `conversation`.
    ///
    /// Returns every event the provider emitted during the turn.
    pub async fn run(
        &self,
        conversation: &mut Conversation,
        user_message: String,
    ) -> Result<Vec<StreamEvent>, AgenticLoopError> {
        conversation.add_user_message(user_message);
        let mut all_events = Vec::new();

        for iteration in 0..self.max_iterations {
            debug!(
                iteration,
                provider = self.provider.provider_name(),
                "Starting agentic loop iteration"
            );

            let mut stream = self
                .provider
                .stream_with_tools(
                    conversation.messages().to_vec(),
                    conversation.system_prompt().map(String::from),
                    self.registry.list(),
                    self.temperature,
                    self.max_tokens,
                )
                .await?;

            let mut text_parts = Vec::new();
            let mut tool_calls: Vec<ToolCall> = Vec::new();
            let mut current_tool_args = String::new();
            let mut current_tool_id = String::new();
            let mut current_tool_name = String::new();
            let mut stop_reason = StopReason::EndTurn;

            while let Some(event) = stream.next().await {
                let event = event?;
                match &event {
                    StreamEvent::TextDelta { text } => text_parts.push(text.clone()),
                    StreamEvent::ToolCallStart { id, name } => {
                        current_tool_id = id.clone();
                        current_tool_name = name.clone();
                        current_tool_args.clear();
                    }
                    StreamEvent::ToolCallDelta {
                        arguments_delta, ..
                    } => current_tool_args.push_str(arguments_delta),
                    StreamEvent::ToolCallEnd { .. } => {
                        tool_calls.push(ToolCall {
                            id: current_tool_id.clone(),
                            name: current_tool_name.clone(),
                            input: parse_arguments(&current_tool_name, &current_tool_args),
                        });
                    }
                    StreamEvent::MessageEnd { stop_reason: reason } => {
                        stop_reason = reason.clone();
                    }
                    StreamEvent::Error { message } => {
                        warn!(message, "Stream error");
                    }
                }
                all_events.push(event);
            }

            let text = if text_parts.is_empty() {
                None
            } else {
                Some(text_parts.concat())
            };
            conversation.add_assistant_response(AssistantContent {
                text,
                tool_calls: tool_calls.clone(),
            });

            if tool_calls.is_empty() || stop_reason == StopReason::EndTurn {
                info!(iteration, "Agentic loop complete");
                return Ok(all_events);
            }

            info!(count = tool_calls.len(), "Executing tool calls");
            for call in &tool_calls {
                let result = self.execute_tool_call(call).await;
                conversation.add_tool_result(result);
            }
        }

        warn!(max = self.max_iterations, "Agentic loop still requesting tools");
        Err(AgenticLoopError::MaxIterations(self.max_iterations))
    }

    async fn execute_tool_call(&self, call: &ToolCall) -> ToolResult {
        let Some(tool) = self.registry.get(&call.name) else {
            warn!(tool = %call.name, "Unknown tool requested");
            return ToolResult {
                tool_call_id: call.id.clone(),
                content: format!("Unknown tool: {}", call.name),
                is_error: true,
            };
        };

        debug!(tool = %call.name, input = %call.input, "Executing tool");
        match tool.execute(call.input.clone()).await {
            Ok(mut result) => {
                result.tool_call_id = call.id.clone();
                result
            }
            Err(e) => {
                warn!(tool = %call.name, error = %e, "Tool failed");
                ToolResult {
                    tool_call_id: call.id.clone(),
                    content: format!("Tool error: {}", e),
                    is_error: true,
                }
            }
        }
    }
}

/// Arguments arrive as a JSON string. Empty means no arguments; garbage
/// becomes `null` so the tool reports invalid input itself.
fn parse_arguments(tool: &str, raw: &str) -> Value {
    if raw.trim().is_empty() {
        return Value::Object(Default::default());
    }
    serde_json::from_str(raw).unwrap_or_else(|e| {
        warn!(tool, error = %e, "Tool arguments are not valid JSON");
        Value::Null
    })
}

#[derive(Debug, thiserror::Error)]
pub enum AgenticLoopError {
    #[error("LLM error: {0}")]
    LlmError(#[from] LlmError),
    #[error("Max iterations ({0}) exceeded")]
    MaxIterations(usize),
}
