use crate::tool::{ToolCall, ToolResult};
use serde::{Deserialize, Serialize};

/// A message in the conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ConversationMessage {
    /// User's text input
    User(String),
    /// Assistant's response (may contain text and/or tool calls)
    Assistant(AssistantContent),
    /// Result of a tool execution
    ToolResult(ToolResult),
}

/// Content from the assistant that can contain mixed text and tool calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantContent {
    /// Text blocks in the response
    pub text: Option<String>,
    /// Tool calls requested by the assistant
    pub tool_calls: Vec<ToolCall>,
}

/// Conversation history kept across turns, with context window awareness.
pub struct Conversation {
    messages: Vec<ConversationMessage>,
    /// Maximum approximate token count before truncation
    max_tokens: usize,
    /// System prompt (always retained)
    system_prompt: Option<String>,
}

impl Conversation {
    pub fn new(max_tokens: usize) -> Self {
        Self {
            messages: Vec::new(),
            max_tokens,
            system_prompt: None,
        }
    }

    pub fn with_system_prompt(mut self, prompt: String) -> Self {
        self.system_prompt = Some(prompt);
        self
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    pub fn add_user_message(&mut self, text: String) {
        self.messages.push(ConversationMessage::User(text));
        self.maybe_truncate();
    }

    pub fn add_assistant_response(&mut self, content: AssistantContent) {
        self.messages.push(ConversationMessage::Assistant(content));
        self.maybe_truncate();
    }

    pub fn add_tool_result(&mut self, result: ToolResult) {
        self.messages.push(ConversationMessage::ToolResult(result));
    }

    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    /// Text of the most recent assistant message, if it had any.
    pub fn last_assistant_text(&self) -> Option<&str> {
        self.messages.iter().rev().find_map(|m| match m {
            ConversationMessage::Assistant(content) => Some(content.text.as_deref()),
            _ => None,
        })?
    }

    /// Approximate token count using character count / 4 heuristic.
    pub fn approximate_tokens(&self) -> usize {
        let char_count: usize = self
            .messages
            .iter()
            .map(|m| match m {
                ConversationMessage::User(text) => text.len(),
                ConversationMessage::Assistant(content) => {
                    content.text.as_ref().map_or(0, |t| t.len())
                        + content
                            .tool_calls
                            .iter()
                            .map(|tc| tc.input.to_string().len())
                            .sum::<usize>()
                }
                ConversationMessage::ToolResult(result) => result.content.len(),
            })
            .sum();
        char_count / 4
    }

    /// Drop oldest messages (keeping system prompt) when over token limit.
    ///
    /// A tool result left at the front would be orphaned from the assistant
    /// message that requested it, so it goes too.
    fn maybe_truncate(&mut self) {
        let mut truncated = false;
        while self.approximate_tokens() > self.max_tokens && self.messages.len() > 2 {
            // Keep at least the last 2 messages (current turn)
            self.messages.remove(0);
            truncated = true;
        }
        if truncated {
            while self.messages.len() > 1
                && matches!(self.messages.first(), Some(ConversationMessage::ToolResult(_)))
            {
                self.messages.remove(0);
            }
        }
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new(100_000)
    }
}
