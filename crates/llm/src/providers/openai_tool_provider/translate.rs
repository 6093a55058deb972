//! Translation from provider-agnostic conversation types to the
//! chat-completions request format.

use serde_json::{json, Value};

use itembox_tool_runtime::{conversation::ConversationMessage, tool::ToolDefinition};

/// Translate a [`ToolDefinition`] into an OpenAI `function` tool.
pub(super) fn tool_definition_to_openai(tool: &ToolDefinition) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": tool.name,
            "description": tool.description,
            "parameters": tool.input_schema,
        }
    })
}

/// Translate a [`ConversationMessage`] into a chat-completions message.
pub(super) fn message_to_openai(msg: &ConversationMessage) -> Value {
    match msg {
        ConversationMessage::User(text) => json!({
            "role": "user",
            "content": text,
        }),
        ConversationMessage::Assistant(content) => {
            let mut message = json!({
                "role": "assistant",
                "content": content.text,
            });
            if !content.tool_calls.is_empty() {
                let calls: Vec<Value> = content
                    .tool_calls
                    .iter()
                    .map(|tc| {
                        json!({
                            "id": tc.id,
                            "type": "function",
                            "function": {
                                "name": tc.name,
                                // The API expects arguments as a JSON-encoded string.
                                "arguments": tc.input.to_string(),
                            }
                        })
                    })
                    .collect();
                message["tool_calls"] = Value::Array(calls);
            }
            message
        }
        ConversationMessage::ToolResult(result) => json!({
            "role": "tool",
            "tool_call_id": result.tool_call_id,
            "content": result.content,
        }),
    }
}

/// Full message list: optional system prompt first, then the conversation.
pub(super) fn build_messages(
    system_prompt: Option<&str>,
    messages: &[ConversationMessage],
) -> Vec<Value> {
    system_prompt
        .map(|s| json!({"role": "system", "content": s}))
        .into_iter()
        .chain(messages.iter().map(message_to_openai))
        .collect()
}
