//! Single-agent turn loop binary.
//!
//! Reads configuration from the environment (optionally overridden by
//! flags), provisions the workspace directories, and runs the bounded
//! completion/execute/feedback loop against the orchestrator's
//! completion endpoint. The final assistant-visible text is printed to
//! stdout; all failure modes inside the loop degrade to conversation
//! text rather than process errors.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use agent::config::{AgentConfig, WorkspacePaths};
use agent::io::llm::HttpCompletionClient;
use agent::logging;
use agent::turn::{TurnEvent, TurnStop, run_turn};

#[derive(Parser)]
#[command(
    name = "agent",
    version,
    about = "Autonomous command-running agent turn loop"
)]
struct Cli {
    /// Override the USER_MSG instruction from the environment.
    #[arg(long)]
    message: Option<String>,
    /// Override the WORKSPACE_DIR root from the environment.
    #[arg(long)]
    workspace: Option<PathBuf>,
    /// Force-enable human-in-the-loop approval for dangerous commands.
    #[arg(long)]
    hitl: bool,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let _ = dotenvy::dotenv();
    logging::init();
    let cli = Cli::parse();

    let mut config = AgentConfig::from_env()?;
    if let Some(message) = cli.message {
        config.user_msg = message;
    }
    if let Some(root) = cli.workspace {
        config.workspace = WorkspacePaths::new(root);
    }
    if cli.hitl {
        config.hitl_enabled = true;
    }
    config.workspace.provision()?;

    let client = HttpCompletionClient::new(&config.orchestrator_url, config.request_timeout)?;
    let outcome = run_turn(&config, &client, print_event)?;

    match outcome.stop {
        TurnStop::Completed { final_response } => emit(&final_response),
        TurnStop::BudgetExhausted => emit(&format!(
            "[agent] turn budget exhausted after {} turns; stopping without a final response",
            outcome.turns_executed
        )),
    }
    Ok(())
}

fn print_event(event: &TurnEvent) {
    match event {
        TurnEvent::CommandLine(line) => emit(line),
        TurnEvent::ApprovalRequired(command) => {
            emit(&format!("[HITL] APPROVAL_REQUIRED: {command}"));
        }
        TurnEvent::Approved(command) => emit(&format!("[HITL] EXECUTING: {command}")),
        TurnEvent::Denied {
            command,
            timed_out: true,
        } => emit(&format!("[HITL] approval timed out, denied: {command}")),
        TurnEvent::Denied {
            command,
            timed_out: false,
        } => emit(&format!("[HITL] denied: {command}")),
    }
}

/// Print one operator-visible line, flushed immediately so lines stream
/// through pipes in real time.
fn emit(line: &str) {
    println!("{line}");
    let _ = std::io::stdout().flush();
}
