//! MCP transport layer.
//!
//! A transport moves whole JSON-RPC messages. Line-oriented transports
//! (stdio, child processes) frame each message as one line of JSON.

use std::collections::{HashMap, VecDeque};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use crate::error::McpError;

/// Trait for MCP message transport.
#[async_trait]
pub trait McpTransport: Send {
    /// Read the next JSON-RPC message from the transport.
    /// Returns `None` when the transport is closed.
    async fn receive(&mut self) -> Result<Option<String>, McpError>;

    /// Write one JSON-RPC message to the transport.
    async fn send(&mut self, message: &str) -> Result<(), McpError>;

    /// Release the underlying resource. Called once on shutdown.
    async fn close(&mut self) -> Result<(), McpError> {
        Ok(())
    }
}

/// Newline-delimited JSON over any async reader/writer pair.
pub struct LineTransport<R, W> {
    reader: R,
    writer: W,
}

/// Reads stdin, writes stdout.
pub type StdioTransport = LineTransport<BufReader<tokio::io::Stdin>, tokio::io::Stdout>;

impl<R, W> LineTransport<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }
}

impl StdioTransport {
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

#[async_trait]
impl<R, W> McpTransport for LineTransport<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn receive(&mut self) -> Result<Option<String>, McpError> {
        let mut line = String::new();
        loop {
            line.clear();
            if self.reader.read_line(&mut line).await? == 0 {
                return Ok(None); // EOF
            }
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                return Ok(Some(trimmed.to_string()));
            }
        }
    }

    async fn send(&mut self, message: &str) -> Result<(), McpError> {
        self.writer.write_all(message.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), McpError> {
        self.writer.shutdown().await?;
        Ok(())
    }
}

/// Line transport to a spawned server process.
///
/// The child's stderr is inherited so its logs reach the terminal.
pub struct ProcessTransport {
    child: Child,
    lines: LineTransport<BufReader<ChildStdout>, ChildStdin>,
}

impl ProcessTransport {
    pub fn spawn(
        command: &str,
        args: &[String],
        env: &HashMap<String, String>,
    ) -> Result<Self, McpError> {
        let mut child = Command::new(command)
            .args(args)
            .envs(env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| McpError::ServerUnavailable(format!("failed to spawn '{}': {}", command, e)))?;

        let stdin = child.stdin.take().ok_or_else(|| {
            McpError::ServerUnavailable("Failed to capture server stdin".to_string())
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            McpError::ServerUnavailable("Failed to capture server stdout".to_string())
        })?;

        Ok(Self {
            child,
            lines: LineTransport::new(BufReader::new(stdout), stdin),
        })
    }
}

#[async_trait]
impl McpTransport for ProcessTransport {
    async fn receive(&mut self) -> Result<Option<String>, McpError> {
        self.lines.receive().await
    }

    async fn send(&mut self, message: &str) -> Result<(), McpError> {
        self.lines.send(message).await
    }

    async fn close(&mut self) -> Result<(), McpError> {
        // Closing stdin lets a well-behaved server exit on EOF; kill covers the rest.
        let _ = self.lines.close().await;
        if let Err(e) = self.child.kill().await {
            tracing::debug!(error = %e, "Server process already exited");
        }
        Ok(())
    }
}

/// Client side of the streamable HTTP transport.
///
/// Each `send` is one `POST`; a JSON body in the reply is queued and handed
/// out by the next `receive`.
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    session_id: Option<String>,
    pending: VecDeque<String>,
}

const SESSION_HEADER: &str = "mcp-session-id";

impl HttpTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            session_id: None,
            pending: VecDeque::new(),
        }
    }
}

#[async_trait]
impl McpTransport for HttpTransport {
    async fn receive(&mut self) -> Result<Option<String>, McpError> {
        Ok(self.pending.pop_front())
    }

    async fn send(&mut self, message: &str) -> Result<(), McpError> {
        let mut request = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(reqwest::header::ACCEPT, "application/json, text/event-stream")
            .body(message.to_string());
        if let Some(id) = &self.session_id {
            request = request.header(SESSION_HEADER, id);
        }

        let response = request
            .send()
            .await
            .map_err(|e| McpError::Http(e.to_string()))?;

        let status = response.status();
        if let Some(id) = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            self.session_id = Some(id.to_string());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(McpError::Http(format!("{}: {}", status, body)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| McpError::Http(e.to_string()))?;
        let body = body.trim();
        if !body.is_empty() {
            self.pending.push_back(body.to_string());
        }
        Ok(())
    }
}

/// In-memory transport for testing, backed by channel pairs.
pub struct ChannelTransport {
    rx: tokio::sync::mpsc::Receiver<String>,
    tx: tokio::sync::mpsc::Sender<String>,
}

impl ChannelTransport {
    /// Create a pair of connected transports.
    ///
    /// Messages sent on one transport are received by the other.
    pub fn pair() -> (Self, Self) {
        let (tx_a, rx_b) = tokio::sync::mpsc::channel(32);
        let (tx_b, rx_a) = tokio::sync::mpsc::channel(32);
        (
            Self { rx: rx_a, tx: tx_a },
            Self { rx: rx_b, tx: tx_b },
        )
    }
}

#[async_trait]
impl McpTransport for ChannelTransport {
    async fn receive(&mut self) -> Result<Option<String>, McpError> {
        Ok(self.rx.recv().await)
    }

    async fn send(&mut self, message: &str) -> Result<(), McpError> {
        self.tx.send(message.to_string()).await.map_err(|e| {
            McpError::Transport(std::io::Error::new(std::io::ErrorKind::BrokenPipe, e))
        })
    }
}
