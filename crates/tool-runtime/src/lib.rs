pub mod agent;
pub mod conversation;
pub mod provider;
pub mod registry;
pub mod runtime;
pub mod stream;
pub mod tool;
pub mod tools;

pub use agent::Agent;
pub use conversation::Conversation;
pub use provider::ToolAwareLlmProvider;
pub use registry::ToolRegistry;
pub use runtime::AgenticLoop;
pub use stream::StreamEvent;
pub use tool::{Tool, ToolCall, ToolDefinition, ToolError, ToolResult};
pub use tools::{register_item_tools, GetItemByIdTool, GetItemsTool, WriteItemTool};
