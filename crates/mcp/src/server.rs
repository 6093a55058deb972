//! MCP server implementation.
//!
//! Wraps a `ToolRegistry` and exposes its tools over JSON-RPC. Message
//! handling is transport-independent: the stdio loop and the HTTP handlers
//! all feed raw messages into [`McpServer::handle_message`].

use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use serde_json::Value;

use itembox_tool_runtime::ToolRegistry;

use crate::error::McpError;
use crate::transport::McpTransport;
use crate::types::*;

/// MCP server that bridges a `ToolRegistry` to MCP clients.
pub struct McpServer {
    registry: ToolRegistry,
    server_name: String,
    server_version: String,
    initialized: AtomicBool,
}

impl McpServer {
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry,
            server_name: "itembox".to_string(),
            server_version: env!("CARGO_PKG_VERSION").to_string(),
            initialized: AtomicBool::new(false),
        }
    }

    /// Whether a client has completed `initialize`.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Relaxed)
    }

    /// Serve requests sequentially until the transport closes.
    pub async fn run<T: McpTransport + ?Sized>(&self, transport: &mut T) -> Result<(), McpError> {
        tracing::info!(server = %self.server_name, tools = self.registry.len(), "MCP server starting");

        while let Some(line) = transport.receive().await? {
            tracing::debug!(message = %line, "Received message");

            if let Some(response) = self.handle_message(&line).await {
                let json = serde_json::to_string(&response)?;
                tracing::debug!(response = %json, "Sending response");
                transport.send(&json).await?;
            }
        }

        tracing::info!("Transport closed, shutting down");
        Ok(())
    }

    /// Handle one raw JSON-RPC message.
    ///
    /// Returns `None` for notifications, which never get a response.
    pub async fn handle_message(&self, raw: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(raw) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to parse JSON");
                return Some(error_response(RpcId::Null, McpError::JsonParse(e)));
            }
        };

        if !value.is_object() {
            return Some(error_response(
                RpcId::Null,
                McpError::InvalidRequest("expected a JSON object".to_string()),
            ));
        }

        // No "id" means notification.
        if value.get("id").is_none() {
            match serde_json::from_value::<JsonRpcNotification>(value) {
                Ok(notif) => self.handle_notification(&notif),
                Err(e) => tracing::warn!(error = %e, "Malformed notification ignored"),
            }
            return None;
        }

        let id = value
            .get("id")
            .and_then(|v| serde_json::from_value::<RpcId>(v.clone()).ok())
            .unwrap_or(RpcId::Null);
        match serde_json::from_value::<JsonRpcRequest>(value) {
            Ok(request) => Some(self.handle_request(&request).await),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to parse JSON-RPC request");
                Some(error_response(id, McpError::InvalidRequest(e.to_string())))
            }
        }
    }

    /// Handle a single JSON-RPC request and produce a response.
    pub async fn handle_request(&self, request: &JsonRpcRequest) -> JsonRpcResponse {
        let id = request.id.clone();

        let result = match request.method.as_str() {
            "initialize" => self.handle_initialize(&request.params),
            "ping" => Ok(Value::Object(Default::default())),
            "tools/list" => self.handle_list_tools(),
            "tools/call" => self.handle_call_tool(&request.params).await,
            method => {
                tracing::warn!(method = %method, "Unknown method");
                Err(McpError::MethodNotFound(method.to_string()))
            }
        };

        match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => error_response(id, e),
        }
    }

    fn handle_notification(&self, notif: &JsonRpcNotification) {
        match notif.method.as_str() {
            "notifications/initialized" => {
                tracing::info!("Client confirmed initialization");
            }
            "notifications/cancelled" => {
                tracing::debug!(params = ?notif.params, "Client cancelled a request");
            }
            method => {
                tracing::debug!(method = %method, "Unknown notification, ignoring");
            }
        }
    }

    fn handle_initialize(&self, params: &Option<Value>) -> Result<Value, McpError> {
        let client = params
            .as_ref()
            .and_then(|p| p.pointer("/clientInfo/name"))
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        tracing::info!(client, "Handling initialize");
        self.initialized.store(true, Ordering::Relaxed);

        to_value(InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability { list_changed: false }),
            },
            server_info: ServerInfo {
                name: self.server_name.clone(),
                version: Some(self.server_version.clone()),
            },
        })
    }

    fn handle_list_tools(&self) -> Result<Value, McpError> {
        tracing::debug!("Handling tools/list");
        let tools: Vec<ToolInfo> = self.registry.list().into_iter().map(ToolInfo::from).collect();
        to_value(ListToolsResult { tools })
    }

    async fn handle_call_tool(&self, params: &Option<Value>) -> Result<Value, McpError> {
        let params = params
            .clone()
            .ok_or_else(|| McpError::InvalidParams("missing params".to_string()))?;
        let call: CallToolParams =
            serde_json::from_value(params).map_err(|e| McpError::InvalidParams(e.to_string()))?;

        let tool = self
            .registry
            .get(&call.name)
            .ok_or_else(|| McpError::ToolNotFound(call.name.clone()))?;

        let arguments = if call.arguments.is_null() {
            Value::Object(Default::default())
        } else {
            call.arguments
        };

        let result = match tool.execute(arguments).await {
            Ok(tool_result) => CallToolResult::text(tool_result.content, tool_result.is_error),
            Err(e) => {
                tracing::warn!(tool = %call.name, error = %e, "Tool call failed");
                CallToolResult::text(e.to_string(), true)
            }
        };
        tracing::info!(tool = %call.name, is_error = result.is_error, "Handled tools/call");

        to_value(result)
    }
}

fn to_value<T: Serialize>(value: T) -> Result<Value, McpError> {
    Ok(serde_json::to_value(value)?)
}

fn error_response(id: RpcId, err: McpError) -> JsonRpcResponse {
    let rpc = err.to_rpc_error();
    JsonRpcResponse::error(id, rpc.code, rpc.message)
}
