mod cli;
mod config;
mod repl;
mod terminal;

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::{info, warn};

use itembox_llm::create_provider;
use itembox_mcp::{McpConfig, McpSessions};
use itembox_tool_runtime::{Agent, AgenticLoop, Conversation, ToolRegistry};

use crate::cli::CliArgs;
use crate::config::CliConfig;
use crate::terminal::Terminal;

#[tokio::main]
async fn main() -> Result<()> {
    itembox_core::config::load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    let config = CliConfig::load(args.config.as_deref())
        .context("failed to load configuration")?;
    let env = itembox_core::Config::from_env();

    // Resolve provider settings
    let settings = config.provider_settings(&args, &env.llm)?;
    let model = settings.model.clone().unwrap_or_default();
    let provider = create_provider(&settings).context("failed to create LLM provider")?;

    // Connect to every configured MCP server
    let mcp_config = McpConfig::load(&args.mcp_config)
        .with_context(|| format!("failed to load {}", args.mcp_config.display()))?;
    let mut sessions = McpSessions::connect_all(&mcp_config)
        .await
        .context("failed to connect to MCP servers")?;

    let mut registry = ToolRegistry::new();
    let tool_count = sessions.register_tools(&mut registry);
    info!(sessions = sessions.len(), tools = tool_count, "MCP tools registered");

    let agentic_loop = AgenticLoop::new(provider, Arc::new(registry))
        .with_max_iterations(args.max_iterations)
        .with_temperature(env.llm.temperature)
        .with_max_tokens(env.llm.max_tokens);

    let mut conversation = Conversation::new(config.max_context_tokens);
    if let Some(prompt) = config.resolve_system_prompt(args.system_prompt.as_deref()) {
        conversation = conversation.with_system_prompt(prompt);
    }
    let mut agent = Agent::new(agentic_loop, conversation);

    let mut terminal = Terminal::stdout();
    terminal.print_banner(settings.kind.as_str(), &model, tool_count)?;
    let stdin = BufReader::new(tokio::io::stdin());
    let (outcome, _) = repl::run_until_exit(
        repl::run(stdin, &mut terminal, &mut agent),
        ctrl_c_pressed(),
        &mut sessions,
    )
    .await;

    let interrupted = match outcome {
        Ok(Some(exit)) => {
            info!(?exit, "REPL finished");
            false
        }
        Ok(None) => {
            // Leave the interrupted prompt line before saying goodbye.
            terminal.print_info("")?;
            info!("Interrupted");
            true
        }
        Err(e) => {
            warn!(error = %e, "REPL failed");
            return Err(e);
        }
    };
    terminal.print_info("Goodbye.")?;
    std::io::stdout().flush()?;

    // The pending stdin read cannot be cancelled and would hold runtime
    // shutdown until the next newline.
    if interrupted {
        std::process::exit(0);
    }
    Ok(())
}

/// Resolves on Ctrl+C. If the handler cannot be installed it never resolves
/// and the REPL ends only through its own exits.
async fn ctrl_c_pressed() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Cannot listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
