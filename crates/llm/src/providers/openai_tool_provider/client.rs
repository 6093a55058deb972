//! [`ToolAwareLlmProvider`] trait implementation for chat-completions APIs.

use async_trait::async_trait;
use futures::stream;
use serde_json::{json, Value};
use tracing::debug;

use itembox_tool_runtime::{
    conversation::ConversationMessage,
    provider::{EventStream, LlmError, ToolAwareLlmProvider},
    tool::ToolDefinition,
};

use super::response::{completion_to_events, error_message};
use super::translate::{build_messages, tool_definition_to_openai};

const DEFAULT_RETRY_AFTER_SECS: u64 = 30;

/// Provider for any OpenAI-compatible `/v1/chat/completions` endpoint.
pub struct OpenAiToolProvider {
    client: reqwest::Client,
    name: String,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl OpenAiToolProvider {
    /// Create a provider.
    ///
    /// # Arguments
    /// * `name` - Label used in logs (e.g. `"groq"`)
    /// * `api_key` - Bearer token; `None` for unauthenticated local servers
    /// * `model` - Model name (e.g. `"llama-3.3-70b-versatile"`)
    /// * `base_url` - API base URL without the `/v1` suffix
    pub fn new(name: String, api_key: Option<String>, model: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            name,
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }
}

#[async_trait]
impl ToolAwareLlmProvider for OpenAiToolProvider {
    async fn stream_with_tools(
        &self,
        messages: Vec<ConversationMessage>,
        system_prompt: Option<String>,
        tools: Vec<ToolDefinition>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<EventStream, LlmError> {
        let url = self.endpoint();

        let mut body = json!({
            "model": self.model,
            "messages": build_messages(system_prompt.as_deref(), &messages),
            "temperature": temperature,
            "max_tokens": max_tokens,
        });
        if !tools.is_empty() {
            let api_tools: Vec<Value> = tools.iter().map(tool_definition_to_openai).collect();
            body["tools"] = Value::Array(api_tools);
            body["tool_choice"] = json!("auto");
        }

        debug!(provider = %self.name, model = %self.model, url = %url, "chat completion request");

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request
            .send()
            .await
            .map_err(|e| LlmError::NetworkError(e.to_string()))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            let body_text = response.text().await.unwrap_or_default();

            return Err(match status {
                401 | 403 => LlmError::AuthError,
                429 => LlmError::RateLimited {
                    retry_after_secs: retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS),
                },
                _ => LlmError::ApiError {
                    status,
                    message: error_message(&body_text),
                },
            });
        }

        let resp: Value = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
        let events = completion_to_events(&resp)?;
        debug!(provider = %self.name, events = events.len(), "chat completion received");

        Ok(Box::pin(stream::iter(events.into_iter().map(Ok))))
    }

    fn provider_name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        &self.model
    }
}
