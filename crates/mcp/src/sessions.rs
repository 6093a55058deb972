//! The set of MCP sessions opened by the agent.

use std::sync::Arc;

use itembox_tool_runtime::{Tool, ToolRegistry};

use crate::client::McpClient;
use crate::config::{McpConfig, ServerEntry};
use crate::error::McpError;

/// Open MCP sessions, closed together with [`McpSessions::close_all`].
#[derive(Default)]
pub struct McpSessions {
    clients: Vec<McpClient>,
}

impl McpSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect to every configured server, in name order.
    ///
    /// If any server fails, the sessions opened so far are closed before the
    /// error is returned.
    pub async fn connect_all(config: &McpConfig) -> Result<Self, McpError> {
        let mut sessions = Self::new();
        for (name, entry) in &config.mcp_servers {
            let connected = match entry {
                ServerEntry::Stdio { command, args, env } => {
                    McpClient::spawn(name.clone(), command, args, env).await
                }
                ServerEntry::Http { url } => McpClient::connect_http(name.clone(), url).await,
            };
            match connected {
                Ok(client) => sessions.add(client),
                Err(e) => {
                    tracing::error!(server = %name, error = %e, "Failed to connect MCP server");
                    sessions.close_all().await;
                    return Err(e);
                }
            }
        }
        Ok(sessions)
    }

    pub fn add(&mut self, client: McpClient) {
        self.clients.push(client);
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Register every remote tool. A name already taken by an earlier
    /// server is skipped with a warning. Returns the number registered.
    pub fn register_tools(&self, registry: &mut ToolRegistry) -> usize {
        let mut registered = 0;
        for client in &self.clients {
            for tool in client.create_tool_adapters() {
                let name = tool.definition().name;
                match registry.register_arc(Arc::new(tool)) {
                    Ok(()) => registered += 1,
                    Err(e) => tracing::warn!(server = %client.name(), tool = %name, error = %e, "Skipping tool"),
                }
            }
        }
        registered
    }

    /// Close and forget every session. Returns how many were closed; a
    /// second call finds nothing left and returns 0.
    pub async fn close_all(&mut self) -> usize {
        let mut closed = 0;
        for client in self.clients.drain(..) {
            match client.shutdown().await {
                Ok(true) => closed += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(server = %client.name(), error = %e, "Error closing MCP session")
                }
            }
        }
        if closed > 0 {
            tracing::info!(count = closed, "Closed MCP sessions");
        }
        closed
    }
}
