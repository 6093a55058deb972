use crate::conversation::Conversation;
use crate::runtime::{AgenticLoop, AgenticLoopError};

/// A conversational agent: an [`AgenticLoop`] plus the memory it keeps
/// between user turns.
pub struct Agent {
    agentic_loop: AgenticLoop,
    conversation: Conversation,
}

impl Agent {
    pub fn new(agentic_loop: AgenticLoop, conversation: Conversation) -> Self {
        Self {
            agentic_loop,
            conversation,
        }
    }

    /// Run one user turn and return the final assistant text.
    ///
    /// A turn that ends without any text yields an empty string.
    pub async fn run(&mut self, text: &str) -> Result<String, AgenticLoopError> {
        self.agentic_loop
            .run(&mut self.conversation, text.to_string())
            .await?;
        Ok(self
            .conversation
            .last_assistant_text()
            .unwrap_or_default()
            .to_string())
    }
}
