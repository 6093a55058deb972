//! The read-eval-print loop.

use anyhow::Result;
use std::future::Future;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{error, info};

use itembox_mcp::McpSessions;
use itembox_tool_runtime::Agent;

use crate::terminal::Terminal;

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplExit {
    /// The user typed `exit` or `quit`.
    ExitWord,
    /// Input closed.
    Eof,
}

fn is_exit_word(input: &str) -> bool {
    input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit")
}

/// Read lines from `input` and answer each through `agent` until an exit
/// word or EOF. Agent failures are printed and the loop carries on.
pub async fn run<R, W>(input: R, terminal: &mut Terminal<W>, agent: &mut Agent) -> Result<ReplExit>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    loop {
        terminal.print_prompt()?;
        let Some(line) = lines.next_line().await? else {
            return Ok(ReplExit::Eof);
        };
        let line = line.trim();

        if is_exit_word(line) {
            return Ok(ReplExit::ExitWord);
        }
        if line.is_empty() {
            continue;
        }

        match agent.run(line).await {
            Ok(response) => terminal.print_response(&response)?,
            Err(e) => {
                error!(error = %e, "Agent turn failed");
                terminal.print_error(&e.to_string())?;
            }
        }
    }
}

/// Drive `repl` until it ends on its own (`Some`) or `interrupt` resolves
/// (`None`), then close every MCP session exactly once whichever way it went.
/// Returns the outcome together with how many sessions were closed.
pub async fn run_until_exit<F, I>(
    repl: F,
    interrupt: I,
    sessions: &mut McpSessions,
) -> (Result<Option<ReplExit>>, usize)
where
    F: Future<Output = Result<ReplExit>>,
    I: Future<Output = ()>,
{
    let outcome = tokio::select! {
        exit = repl => exit.map(Some),
        _ = interrupt => Ok(None),
    };

    let closed = sessions.close_all().await;
    info!(closed, "MCP sessions closed");
    (outcome, closed)
}
