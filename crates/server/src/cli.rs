//! Command-line overrides for the server configuration.

use std::path::PathBuf;

use clap::Parser;

use itembox_core::{Config, Transport};

/// MCP server exposing the item store as tools.
///
/// Every flag is optional. Unset flags fall back to the environment
/// (`ITEMBOX_DB_PATH`, `ITEMBOX_TRANSPORT`, `ITEMBOX_HOST`, `ITEMBOX_PORT`,
/// each profiled by `ITEMBOX_PROFILE`) and then to the built-in defaults.
#[derive(Parser, Debug)]
#[command(name = "itembox-server", version, about = "MCP server for the item store")]
pub struct ServerArgs {
    /// SQLite database file (default: database.db)
    #[arg(long)]
    pub db_path: Option<PathBuf>,

    /// Transport: stdio, sse or streamable-http (default: stdio)
    #[arg(long)]
    pub transport: Option<Transport>,

    /// Bind host for the HTTP transports (default: 127.0.0.1)
    #[arg(long)]
    pub host: Option<String>,

    /// Bind port for the HTTP transports (default: 8000)
    #[arg(long)]
    pub port: Option<u16>,
}

impl ServerArgs {
    /// Layer the flags that were given over the env-derived config.
    pub fn apply(self, config: &mut Config) {
        if let Some(path) = self.db_path {
            config.store.db_path = path;
        }
        if let Some(transport) = self.transport {
            config.server.transport = transport;
        }
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
    }
}
