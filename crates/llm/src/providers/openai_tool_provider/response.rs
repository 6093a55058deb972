//! Parsing of a completed chat-completions response into [`StreamEvent`]s.

use serde_json::Value;

use itembox_tool_runtime::{
    provider::LlmError,
    stream::{StopReason, StreamEvent},
};

/// Replay `choices[0]` as text, tool-call and end events.
pub(super) fn completion_to_events(resp: &Value) -> Result<Vec<StreamEvent>, LlmError> {
    let choice = resp["choices"]
        .get(0)
        .ok_or_else(|| LlmError::InvalidResponse("missing choices[0]".into()))?;
    let message = &choice["message"];
    if !message.is_object() {
        return Err(LlmError::InvalidResponse(
            "missing choices[0].message".into(),
        ));
    }

    let mut events = Vec::new();

    if let Some(text) = message["content"].as_str() {
        if !text.is_empty() {
            events.push(StreamEvent::TextDelta {
                text: text.to_string(),
            });
        }
    }

    let calls = message["tool_calls"].as_array().map(Vec::as_slice).unwrap_or(&[]);
    for call in calls {
        let id = call["id"].as_str().unwrap_or_default().to_string();
        let function = &call["function"];
        let name = function["name"]
            .as_str()
            .ok_or_else(|| LlmError::InvalidResponse("tool call without function name".into()))?
            .to_string();
        // Some servers send arguments as an object instead of a string.
        let arguments = match &function["arguments"] {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        };

        events.push(StreamEvent::ToolCallStart {
            id: id.clone(),
            name,
        });
        events.push(StreamEvent::ToolCallDelta {
            id: id.clone(),
            arguments_delta: arguments,
        });
        events.push(StreamEvent::ToolCallEnd { id });
    }

    let mut stop_reason = StopReason::from_finish_reason(choice["finish_reason"].as_str());
    if !calls.is_empty() {
        stop_reason = StopReason::ToolUse;
    }
    events.push(StreamEvent::MessageEnd { stop_reason });

    Ok(events)
}

/// Best-effort extraction of `error.message` from an error body.
pub(super) fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(String::from))
        .unwrap_or_else(|| body.to_string())
}
