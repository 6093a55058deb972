//! MCP client implementation.
//!
//! Connects to an MCP server over any [`McpTransport`], performs the
//! initialize handshake, discovers tools and exposes each remote tool as a
//! local [`Tool`] through [`McpTool`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use itembox_tool_runtime::tool::{Tool, ToolDefinition, ToolError, ToolResult};

use crate::error::McpError;
use crate::transport::{HttpTransport, McpTransport, ProcessTransport};
use crate::types::*;

/// One JSON-RPC session. Requests are serialized through the transport lock,
/// so at most one request is outstanding at a time.
struct Connection {
    transport: Mutex<Box<dyn McpTransport>>,
    next_id: AtomicI64,
    closed: AtomicBool,
}

impl Connection {
    fn new(transport: Box<dyn McpTransport>) -> Self {
        Self {
            transport: Mutex::new(transport),
            next_id: AtomicI64::new(1),
            closed: AtomicBool::new(false),
        }
    }

    fn ensure_open(&self) -> Result<(), McpError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(McpError::ServerUnavailable("session closed".to_string()));
        }
        Ok(())
    }

    /// Send a request and wait for the response with the matching id.
    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value, McpError> {
        self.ensure_open()?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let json = serde_json::to_string(&JsonRpcRequest::new(RpcId::Number(id), method, params))?;

        let mut transport = self.transport.lock().await;
        tracing::debug!(method = %method, id, "Sending request");
        transport.send(&json).await?;

        loop {
            let line = transport.receive().await?.ok_or_else(|| {
                McpError::ServerUnavailable(format!("connection closed awaiting '{}'", method))
            })?;
            let value: Value = serde_json::from_str(&line)?;
            if value.get("id").is_none() {
                tracing::debug!(message = %line, "Skipping server notification");
                continue;
            }

            let response: JsonRpcResponse = serde_json::from_value(value)?;
            if response.id != RpcId::Number(id) {
                tracing::warn!(expected = id, got = ?response.id, "Skipping unmatched response");
                continue;
            }
            if let Some(err) = response.error {
                return Err(err.into());
            }
            return response
                .result
                .ok_or_else(|| McpError::InvalidRequest("response without result".to_string()));
        }
    }

    async fn notify(&self, method: &str, params: Option<Value>) -> Result<(), McpError> {
        self.ensure_open()?;
        let json = serde_json::to_string(&JsonRpcNotification::new(method, params))?;
        self.transport.lock().await.send(&json).await
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult, McpError> {
        let params = serde_json::json!({
            "name": name,
            "arguments": arguments,
        });
        let result = self.request("tools/call", Some(params)).await?;
        Ok(serde_json::from_value(result)?)
    }

    /// Close the transport. Only the first call does anything.
    async fn close(&self) -> Result<bool, McpError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(false);
        }
        self.transport.lock().await.close().await?;
        Ok(true)
    }
}

/// A connected MCP client with its discovered tools.
pub struct McpClient {
    name: String,
    connection: Arc<Connection>,
    server_info: Option<ServerInfo>,
    tools: Vec<ToolInfo>,
}

impl McpClient {
    /// Handshake over an already open transport.
    pub async fn connect(
        name: impl Into<String>,
        transport: Box<dyn McpTransport>,
    ) -> Result<Self, McpError> {
        let mut client = Self {
            name: name.into(),
            connection: Arc::new(Connection::new(transport)),
            server_info: None,
            tools: Vec::new(),
        };

        if let Err(e) = client.handshake().await {
            let _ = client.connection.close().await;
            return Err(e);
        }
        Ok(client)
    }

    /// Spawn a stdio server process and connect to it.
    pub async fn spawn(
        name: impl Into<String>,
        command: &str,
        args: &[String],
        env: &HashMap<String, String>,
    ) -> Result<Self, McpError> {
        let name = name.into();
        tracing::info!(server = %name, command, "Spawning MCP server process");
        let transport = ProcessTransport::spawn(command, args, env)?;
        Self::connect(name, Box::new(transport)).await
    }

    /// Connect to a streamable-HTTP server.
    pub async fn connect_http(name: impl Into<String>, url: &str) -> Result<Self, McpError> {
        let name = name.into();
        tracing::info!(server = %name, url, "Connecting to MCP server over HTTP");
        Self::connect(name, Box::new(HttpTransport::new(url))).await
    }

    async fn handshake(&mut self) -> Result<(), McpError> {
        let params = serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {
                "name": "itembox-agent",
                "version": env!("CARGO_PKG_VERSION")
            }
        });
        let result = self.connection.request("initialize", Some(params)).await?;
        let init: InitializeResult = serde_json::from_value(result)?;
        if init.protocol_version != PROTOCOL_VERSION {
            tracing::warn!(
                server = %self.name,
                version = %init.protocol_version,
                "Server negotiated a different protocol version"
            );
        }
        self.server_info = Some(init.server_info);

        self.connection
            .notify("notifications/initialized", None)
            .await?;
        tracing::info!(server = %self.name, "MCP client initialized");

        self.refresh_tools().await
    }

    /// Re-read the server's tool list.
    pub async fn refresh_tools(&mut self) -> Result<(), McpError> {
        let result = self.connection.request("tools/list", None).await?;
        let list: ListToolsResult = serde_json::from_value(result)?;
        self.tools = list.tools;
        self.tools.sort_by(|a, b| a.name.cmp(&b.name));
        for tool in &self.tools {
            tracing::debug!(server = %self.name, name = %tool.name, "Discovered tool");
        }
        tracing::info!(server = %self.name, count = self.tools.len(), "Tool discovery complete");
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn server_info(&self) -> Option<&ServerInfo> {
        self.server_info.as_ref()
    }

    pub async fn ping(&self) -> Result<(), McpError> {
        self.connection.request("ping", None).await.map(|_| ())
    }

    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult, McpError> {
        self.connection.call_tool(name, arguments).await
    }

    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().cloned().map(ToolDefinition::from).collect()
    }

    /// One [`McpTool`] per discovered tool, sharing this session.
    pub fn create_tool_adapters(&self) -> Vec<McpTool> {
        self.tools
            .iter()
            .map(|info| McpTool {
                info: info.clone(),
                connection: Arc::clone(&self.connection),
            })
            .collect()
    }

    /// Close the session. Returns `false` if it was already closed.
    pub async fn shutdown(&self) -> Result<bool, McpError> {
        let closed = self.connection.close().await?;
        if closed {
            tracing::info!(server = %self.name, "MCP session closed");
        }
        Ok(closed)
    }
}

/// A remote tool that forwards execution to its MCP session.
pub struct McpTool {
    info: ToolInfo,
    connection: Arc<Connection>,
}

#[async_trait]
impl Tool for McpTool {
    fn definition(&self) -> ToolDefinition {
        self.info.clone().into()
    }

    async fn execute(&self, input: Value) -> Result<ToolResult, ToolError> {
        let result = self
            .connection
            .call_tool(&self.info.name, input)
            .await
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;

        Ok(ToolResult {
            tool_call_id: String::new(), // Set by caller
            content: result.joined_text(),
            is_error: result.is_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::McpServer;
    use crate::transport::ChannelTransport;
    use itembox_tool_runtime::ToolRegistry;

    struct ShoutTool;

    #[async_trait]
    impl Tool for ShoutTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: "shout".to_string(),
                description: "Uppercase text".to_string(),
                input_schema: serde_json::json!({"type": "object"}),
            }
        }

        async fn execute(&self, input: Value) -> Result<ToolResult, ToolError> {
            let text = input["text"].as_str().unwrap_or_default();
            Ok(ToolResult::text(text.to_uppercase()))
        }
    }

    async fn connected_client() -> McpClient {
        let (client_side, mut server_side) = ChannelTransport::pair();
        let mut registry = ToolRegistry::new();
        registry.register(ShoutTool).unwrap();
        let server = McpServer::new(registry);
        tokio::spawn(async move { server.run(&mut server_side).await });
        McpClient::connect("test", Box::new(client_side)).await.unwrap()
    }

    #[tokio::test]
    async fn test_connect_discovers_tools() {
        let client = connected_client().await;
        assert_eq!(client.server_info().unwrap().name, "itembox");
        let defs = client.tool_definitions();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "shout");
        client.ping().await.unwrap();
    }

    #[tokio::test]
    async fn test_adapter_forwards_calls() {
        let client = connected_client().await;
        let adapters = client.create_tool_adapters();
        let result = adapters[0]
            .execute(serde_json::json!({"text": "hi"}))
            .await
            .unwrap();
        assert_eq!(result.content, "HI");
        assert!(!result.is_error);
    }

    #[tokio::test]
    async fn test_unknown_tool_is_rpc_error() {
        let client = connected_client().await;
        let err = client.call_tool("missing", serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, McpError::Rpc { code: error_codes::INVALID_PARAMS, .. }));
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let client = connected_client().await;
        let adapters = client.create_tool_adapters();
        assert!(client.shutdown().await.unwrap());
        assert!(!client.shutdown().await.unwrap());

        let err = adapters[0].execute(serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::ExecutionFailed(_)));
    }

    #[tokio::test]
    async fn test_server_gone_fails_connect() {
        let (client_side, server_side) = ChannelTransport::pair();
        drop(server_side);
        assert!(McpClient::connect("gone", Box::new(client_side)).await.is_err());
    }
}
