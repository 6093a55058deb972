mod cli;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use itembox_core::{Config, Transport};
use itembox_mcp::{http, McpServer, StdioTransport};
use itembox_store::ItemStore;
use itembox_tool_runtime::{register_item_tools, ToolRegistry};

use crate::cli::ServerArgs;

#[tokio::main]
async fn main() -> Result<()> {
    itembox_core::config::load_dotenv();

    // stdout carries the stdio transport, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args = ServerArgs::parse();
    let mut config = Config::from_env();
    args.apply(&mut config);
    config.log_summary();

    let store = ItemStore::new(config.store.db_path.clone());
    store
        .init()
        .await
        .with_context(|| format!("failed to open database {}", config.store.db_path.display()))?;

    let mut registry = ToolRegistry::new();
    register_item_tools(&mut registry, Arc::new(store)).context("failed to register item tools")?;
    let server = McpServer::new(registry);

    let transport = config.server.transport;
    info!("🚀 Starting MCP Server with {} transport", transport);

    match transport {
        Transport::Stdio => {
            let mut stdio = StdioTransport::stdio();
            server.run(&mut stdio).await.context("stdio transport failed")?;
        }
        Transport::Sse => {
            let (stop_tx, stop_rx) = watch::channel(false);
            let router = http::sse_router(Arc::new(server), stop_rx);
            let shutdown = async move {
                shutdown_signal().await;
                // Open event streams must end before graceful shutdown can finish.
                let _ = stop_tx.send(true);
            };
            http::serve(router, &config.server.bind_address(), shutdown)
                .await
                .context("SSE transport failed")?;
        }
        Transport::StreamableHttp => {
            let router = http::streamable_http_router(Arc::new(server));
            http::serve(router, &config.server.bind_address(), shutdown_signal())
                .await
                .context("streamable HTTP transport failed")?;
        }
    }

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl+C, serving until killed");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
