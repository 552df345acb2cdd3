//! The bounded request/parse/approve/execute/feedback loop.
//!
//! Strictly sequential: exactly one completion call, one parse, one
//! approval wait, and one execution are outstanding at a time. The
//! approval gate and the executor are the two blocking suspension
//! points, each with its own ceiling; the turn budget is the only
//! cancellation mechanism against a model that never stops requesting
//! commands.

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::config::AgentConfig;
use crate::core::message::{Message, MessageLog};
use crate::core::protocol::{command_lines, extract_command};
use crate::io::approval::{ApprovalDecision, ApprovalGate};
use crate::io::exec::ShellExecutor;
use crate::io::llm::CompletionClient;
use crate::prompt::render_system_prompt;

/// Fixed feedback appended when a command is denied or the approval
/// wait times out.
pub const DENIAL_MESSAGE: &str = "ERROR: Command denied by user";

/// Operator-visible events emitted while the loop runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnEvent {
    /// A `COMMAND:` line observed in the raw response, surfaced for
    /// live visibility as responses arrive.
    CommandLine(String),
    /// A dangerous command is waiting for out-of-band approval.
    ApprovalRequired(String),
    /// The pending command was approved and is about to run.
    Approved(String),
    /// The pending command was denied, or the approval wait timed out.
    Denied { command: String, timed_out: bool },
}

/// Why the loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnStop {
    /// The model produced a response with no action directive; the
    /// response is the final output for the operator.
    Completed { final_response: String },
    /// The turn budget ran out while the model was still requesting
    /// commands. No final response exists.
    BudgetExhausted,
}

/// Summary of one loop invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    /// Completion calls made (1-indexed turns).
    pub turns_executed: u32,
    pub stop: TurnStop,
}

/// Run the turn loop to completion or budget exhaustion.
///
/// Per turn: call the completion client, append the response, parse a
/// command. No command ends the loop with the response as final output.
/// A dangerous command under HITL first passes the approval gate; denial
/// and timeout append [`DENIAL_MESSAGE`] instead of executing. Every
/// executed or denied command appends exactly one user-role message
/// before the next completion call.
///
/// Failure classes all degrade to conversation text (transport errors
/// arrive as the response, execution failures as feedback), so `Err` is
/// reserved for setup problems such as an invalid prompt template
/// context.
pub fn run_turn<C: CompletionClient, F: FnMut(&TurnEvent)>(
    config: &AgentConfig,
    client: &C,
    mut on_event: F,
) -> Result<TurnOutcome> {
    let mut log = MessageLog::new(render_system_prompt(config)?);
    log.extend(config.history.iter().cloned());
    log.append(Message::user(config.user_msg.clone()));

    let policy = &config.danger_policy;
    let gate = ApprovalGate::new(
        &config.approval.approve_marker,
        &config.approval.deny_marker,
        config.approval.poll_interval,
        config.approval.ceiling,
    );
    let executor = ShellExecutor::new(
        &config.shell,
        &config.workspace.work_dir,
        config.command_timeout,
        config.output_limit_bytes,
    );

    let mut turns = 0u32;
    while turns < config.max_turns {
        turns += 1;
        debug!(turn = turns, messages = log.len(), "requesting completion");
        let response = client.complete(log.snapshot(), &config.agent_id);

        for line in command_lines(&response) {
            on_event(&TurnEvent::CommandLine(line.to_string()));
        }
        log.append(Message::assistant(response.clone()));

        let Some(command) = extract_command(&response) else {
            debug!(turn = turns, "no command requested, loop complete");
            return Ok(TurnOutcome {
                turns_executed: turns,
                stop: TurnStop::Completed {
                    final_response: response,
                },
            });
        };

        if config.hitl_enabled && policy.is_dangerous(&command) {
            info!(turn = turns, "dangerous command requires approval");
            on_event(&TurnEvent::ApprovalRequired(command.clone()));
            match gate.wait() {
                ApprovalDecision::Approved => {
                    on_event(&TurnEvent::Approved(command.clone()));
                }
                decision @ (ApprovalDecision::Denied | ApprovalDecision::TimedOut) => {
                    on_event(&TurnEvent::Denied {
                        command,
                        timed_out: decision == ApprovalDecision::TimedOut,
                    });
                    log.append(Message::user(DENIAL_MESSAGE));
                    continue;
                }
            }
        }

        let result = executor.run(&command);
        log.append(Message::user(result.render()));
    }

    warn!(
        max_turns = config.max_turns,
        "turn budget exhausted while commands were still requested"
    );
    Ok(TurnOutcome {
        turns_executed: turns,
        stop: TurnStop::BudgetExhausted,
    })
}
