//! OpenAI chat-completions implementation of [`ToolAwareLlmProvider`].
//!
//! Requests are sent without streaming; the finished completion is replayed
//! as provider-agnostic [`StreamEvent`]s so the agentic loop consumes it the
//! same way as any other backend.
//!
//! [`ToolAwareLlmProvider`]: itembox_tool_runtime::provider::ToolAwareLlmProvider
//! [`StreamEvent`]: itembox_tool_runtime::stream::StreamEvent

mod client;
mod response;
mod translate;

pub use self::client::OpenAiToolProvider;
