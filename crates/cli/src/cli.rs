use std::path::PathBuf;

use clap::Parser;

/// Interactive AI agent for the item store.
///
/// Connects to the MCP servers listed in the server-config file, hands
/// their tools to an LLM, and answers free-text questions in a REPL.
#[derive(Parser, Debug)]
#[command(name = "itembox-agent", version, about = "Interactive AI agent for the item store")]
pub struct CliArgs {
    /// Path to config file (default: ~/.config/itembox-agent/config.toml)
    #[arg(long)]
    pub config: Option<String>,

    /// MCP server definitions in `mcpServers` JSON format
    #[arg(long, default_value = "database.json")]
    pub mcp_config: PathBuf,

    /// LLM provider to use: groq, openai, or ollama
    #[arg(long, env = "LLM_PROVIDER")]
    pub provider: Option<String>,

    /// Model name override (uses provider default if not set)
    #[arg(long)]
    pub model: Option<String>,

    /// API key (overrides env var and config file)
    #[arg(long)]
    pub api_key: Option<String>,

    /// System prompt override
    #[arg(long)]
    pub system_prompt: Option<String>,

    /// Maximum agentic loop iterations per turn
    #[arg(long, default_value = "10")]
    pub max_iterations: usize,
}
