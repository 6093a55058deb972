//! SSE and streamable HTTP transports against a live listener.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::{json, Value};
use tokio::sync::{oneshot, watch};

use itembox_mcp::http::{serve_listener, sse_router, streamable_http_router};
use itembox_mcp::{McpClient, McpServer};
use itembox_tool_runtime::{Tool, ToolDefinition, ToolError, ToolRegistry, ToolResult};

struct Greet;

#[async_trait]
impl Tool for Greet {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "greet".to_string(),
            description: "Say hello".to_string(),
            input_schema: json!({"type": "object", "properties": {"who": {"type": "string"}}}),
        }
    }

    async fn execute(&self, input: Value) -> Result<ToolResult, ToolError> {
        let who = input["who"].as_str().unwrap_or("world");
        Ok(ToolResult::text(format!("hello {}", who)))
    }
}

fn server() -> Arc<McpServer> {
    let mut registry = ToolRegistry::new();
    registry.register(Greet).unwrap();
    Arc::new(McpServer::new(registry))
}

async fn serve(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn streamable_http_request_and_notification() {
    let base = serve(streamable_http_router(server())).await;
    let http = reqwest::Client::new();

    let resp = http
        .post(format!("{}/mcp", base))
        .body(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["id"], 1);
    assert_eq!(body["result"], json!({}));

    let resp = http
        .post(format!("{}/mcp", base))
        .body(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 202);
    assert!(resp.text().await.unwrap().is_empty());
}

#[tokio::test]
async fn client_over_streamable_http() {
    let base = serve(streamable_http_router(server())).await;
    let client = McpClient::connect_http("remote", &format!("{}/mcp", base))
        .await
        .unwrap();

    assert_eq!(client.tool_definitions()[0].name, "greet");
    let result = client.call_tool("greet", json!({"who": "items"})).await.unwrap();
    assert_eq!(result.joined_text(), "hello items");
    assert!(client.shutdown().await.unwrap());
}

/// Read SSE frames until one with the given event name arrives; returns its data.
async fn next_event<S>(stream: &mut S, buffer: &mut String, name: &str) -> String
where
    S: futures::Stream<Item = reqwest::Result<bytes::Bytes>> + Unpin,
{
    loop {
        while let Some(end) = buffer.find("\n\n") {
            let frame = buffer[..end].to_string();
            buffer.drain(..end + 2);
            let mut event = None;
            let mut data = String::new();
            for line in frame.lines() {
                if let Some(v) = line.strip_prefix("event:") {
                    event = Some(v.trim().to_string());
                } else if let Some(v) = line.strip_prefix("data:") {
                    data.push_str(v.trim_start());
                }
            }
            if event.as_deref() == Some(name) {
                return data;
            }
        }
        let chunk = tokio::time::timeout(Duration::from_secs(5), stream.next())
            .await
            .expect("timed out waiting for SSE event")
            .expect("stream ended")
            .unwrap();
        buffer.push_str(&String::from_utf8_lossy(&chunk));
    }
}

#[tokio::test]
async fn sse_endpoint_then_message_events() {
    let base = serve(sse_router(server(), watch::channel(false).1)).await;
    let http = reqwest::Client::new();

    let resp = http.get(format!("{}/sse", base)).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let mut stream = Box::pin(resp.bytes_stream());
    let mut buffer = String::new();

    let endpoint = next_event(&mut stream, &mut buffer, "endpoint").await;
    assert!(endpoint.starts_with("/messages?session_id="));

    let post = http
        .post(format!("{}{}", base, endpoint))
        .body(r#"{"jsonrpc":"2.0","id":7,"method":"tools/call","params":{"name":"greet","arguments":{}}}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(post.status(), 202);

    let message = next_event(&mut stream, &mut buffer, "message").await;
    let response: Value = serde_json::from_str(&message).unwrap();
    assert_eq!(response["id"], 7);
    assert_eq!(response["result"]["content"][0]["text"], "hello world");
}

#[tokio::test]
async fn sse_unknown_session_is_404() {
    let base = serve(sse_router(server(), watch::channel(false).1)).await;
    let resp = reqwest::Client::new()
        .post(format!("{}/messages?session_id=nope", base))
        .body(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn sse_streams_end_when_shutdown_fires() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let (stop_tx, stop_rx) = watch::channel(false);
    let (fire, fired) = oneshot::channel::<()>();
    let shutdown = async move {
        let _ = fired.await;
        let _ = stop_tx.send(true);
    };
    let handle = tokio::spawn(serve_listener(listener, sse_router(server(), stop_rx), shutdown));

    let http = reqwest::Client::new();
    let resp = http.get(format!("{}/sse", base)).send().await.unwrap();
    let mut stream = Box::pin(resp.bytes_stream());
    let mut buffer = String::new();
    let endpoint = next_event(&mut stream, &mut buffer, "endpoint").await;
    assert!(endpoint.starts_with("/messages?session_id="));

    fire.send(()).unwrap();

    let served = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server still running after shutdown with an SSE client attached");
    served.unwrap().unwrap();

    let drained = tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(chunk) = stream.next().await {
            if chunk.is_err() {
                break;
            }
        }
    })
    .await;
    assert!(drained.is_ok(), "event stream did not end");
}
