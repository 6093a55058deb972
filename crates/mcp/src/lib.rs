//! MCP (Model Context Protocol) over JSON-RPC 2.0.
//!
//! # Architecture
//!
//! - **types**: JSON-RPC 2.0 and MCP protocol types
//! - **transport**: message transports (stdio, child process, HTTP client, channels)
//! - **server**: `McpServer`, exposing a `ToolRegistry`
//! - **http**: axum routers for the SSE and streamable HTTP transports
//! - **client**: `McpClient` and the `McpTool` adapter
//! - **config**: `mcpServers` JSON server definitions
//! - **sessions**: the set of open client sessions
//! - **error**: unified error type
//!
//! # Usage
//!
//! ## Server
//! ```no_run
//! use itembox_mcp::server::McpServer;
//! use itembox_mcp::transport::StdioTransport;
//! use itembox_tool_runtime::ToolRegistry;
//!
//! # async fn example() {
//! let server = McpServer::new(ToolRegistry::new());
//! let mut transport = StdioTransport::stdio();
//! server.run(&mut transport).await.unwrap();
//! # }
//! ```
//!
//! ## Client
//! ```no_run
//! use std::collections::HashMap;
//! use itembox_mcp::client::McpClient;
//!
//! # async fn example() {
//! let client = McpClient::spawn("items", "itembox-server", &[], &HashMap::new()).await.unwrap();
//! let tools = client.tool_definitions();
//! client.shutdown().await.unwrap();
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod server;
pub mod sessions;
pub mod transport;
pub mod types;

pub use client::{McpClient, McpTool};
pub use config::{McpConfig, ServerEntry};
pub use error::McpError;
pub use server::McpServer;
pub use sessions::McpSessions;
pub use transport::{ChannelTransport, HttpTransport, LineTransport, McpTransport, ProcessTransport, StdioTransport};
pub use types::*;
