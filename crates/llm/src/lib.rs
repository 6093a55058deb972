//! LLM backends for the item agent.
//!
//! Every supported backend speaks the OpenAI chat-completions dialect, so a
//! single [`OpenAiToolProvider`] covers Groq, OpenAI and a local Ollama.

pub mod providers;

pub use providers::openai_tool_provider::OpenAiToolProvider;
pub use providers::{create_provider, ProviderKind, ProviderSettings};
