//! Client-side server definitions in the common `mcpServers` JSON format.
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "items": { "command": "itembox-server", "args": [], "env": {"ITEMBOX_DB_PATH": "database.db"} },
//!     "remote": { "url": "http://127.0.0.1:8000/mcp" }
//!   }
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::McpError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpConfig {
    #[serde(default)]
    pub mcp_servers: BTreeMap<String, ServerEntry>,
}

/// How to reach one server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerEntry {
    /// Spawn a process and speak newline-delimited JSON over its stdio.
    Stdio {
        command: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        env: HashMap<String, String>,
    },
    /// POST to a streamable-HTTP endpoint.
    Http { url: String },
}

impl McpConfig {
    pub fn from_json(json: &str) -> Result<Self, McpError> {
        let config: McpConfig =
            serde_json::from_str(json).map_err(|e| McpError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, McpError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            McpError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    fn validate(&self) -> Result<(), McpError> {
        if self.mcp_servers.is_empty() {
            return Err(McpError::Config("no servers under \"mcpServers\"".to_string()));
        }
        for (name, entry) in &self.mcp_servers {
            let blank = match entry {
                ServerEntry::Stdio { command, .. } => command.trim().is_empty(),
                ServerEntry::Http { url } => url.trim().is_empty(),
            };
            if blank {
                return Err(McpError::Config(format!("server '{}' has an empty target", name)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stdio_and_http_entries() {
        let config = McpConfig::from_json(
            r#"{
                "mcpServers": {
                    "items": {"command": "itembox-server", "args": ["--transport", "stdio"], "env": {"ITEMBOX_DB_PATH": "x.db"}},
                    "remote": {"url": "http://127.0.0.1:8000/mcp"}
                }
            }"#,
        )
        .unwrap();

        assert_eq!(config.mcp_servers.len(), 2);
        match &config.mcp_servers["items"] {
            ServerEntry::Stdio { command, args, env } => {
                assert_eq!(command, "itembox-server");
                assert_eq!(args, &["--transport", "stdio"]);
                assert_eq!(env["ITEMBOX_DB_PATH"], "x.db");
            }
            other => panic!("expected stdio entry, got {:?}", other),
        }
        assert_eq!(
            config.mcp_servers["remote"],
            ServerEntry::Http {
                url: "http://127.0.0.1:8000/mcp".to_string()
            }
        );
    }

    #[test]
    fn test_args_and_env_default_empty() {
        let config = McpConfig::from_json(r#"{"mcpServers": {"s": {"command": "python"}}}"#).unwrap();
        assert!(matches!(
            &config.mcp_servers["s"],
            ServerEntry::Stdio { args, env, .. } if args.is_empty() && env.is_empty()
        ));
    }

    #[test]
    fn test_invalid_configs_rejected() {
        assert!(McpConfig::from_json(r#"{"mcpServers": {}}"#).is_err());
        assert!(McpConfig::from_json(r#"{"mcpServers": {"s": {"port": 1}}}"#).is_err());
        assert!(McpConfig::from_json(r#"{"mcpServers": {"s": {"command": " "}}}"#).is_err());
        assert!(McpConfig::from_json("not json").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("database.json");
        std::fs::write(&path, r#"{"mcpServers": {"items": {"command": "itembox-server"}}}"#).unwrap();
        assert_eq!(McpConfig::load(&path).unwrap().mcp_servers.len(), 1);
        assert!(McpConfig::load(&dir.path().join("missing.json")).is_err());
    }
}
