//! Loop-level harness tests for full turn lifecycle scenarios.
//!
//! These tests drive `run_turn` through multiple turns with a scripted
//! completion client and a temp workspace to verify end-to-end behavior:
//! execution feedback, approval gating, and loop termination.

use agent::core::message::Role;
use agent::io::exec::{NO_OUTPUT_SENTINEL, OUTPUT_PREFIX};
use agent::test_support::{ScriptedClient, TestWorkspace};
use agent::turn::{DENIAL_MESSAGE, TurnEvent, TurnStop, run_turn};

/// Scenario: user asks to list files, HITL disabled.
///
/// Sequence:
/// 1. Turn 1: model requests `ls`, the command runs in the scratch dir.
/// 2. Turn 2: model answers in plain text, loop completes.
///
/// The second completion call must see the command output as the
/// trailing user message, preserving request/response alternation.
#[test]
fn list_files_executes_once_then_completes() {
    let workspace = TestWorkspace::new().expect("workspace");
    let mut config = workspace.config.clone();
    config.user_msg = "list files".to_string();
    std::fs::write(config.workspace.work_dir.join("hello.txt"), "hi").expect("seed file");

    let client = ScriptedClient::new([
        "Listing now.\nACTION: EXECUTE\nCOMMAND: ls",
        "The workspace contains hello.txt.",
    ]);

    let outcome = run_turn(&config, &client, |_| {}).expect("run");

    assert_eq!(outcome.turns_executed, 2);
    assert_eq!(
        outcome.stop,
        TurnStop::Completed {
            final_response: "The workspace contains hello.txt.".to_string()
        }
    );

    let calls = client.calls();
    assert_eq!(calls.len(), 2);
    let feedback = calls[1].last().expect("messages");
    assert_eq!(feedback.role, Role::User);
    assert_eq!(feedback.content, format!("{OUTPUT_PREFIX}\nhello.txt\n"));
}

/// Scenario: model requests `sudo apt install x` with HITL enabled and
/// no marker ever appears.
///
/// After the (shrunk) approval ceiling elapses the loop must append the
/// denial notice and proceed to another completion call rather than
/// crash or execute.
#[test]
fn unapproved_dangerous_command_times_out_into_denial() {
    let workspace = TestWorkspace::new().expect("workspace");
    let mut config = workspace.config.clone();
    config.hitl_enabled = true;

    let client = ScriptedClient::new([
        "ACTION: EXECUTE\nCOMMAND: sudo apt install x",
        "Understood, I cannot install packages.",
    ]);

    let mut events = Vec::new();
    let outcome = run_turn(&config, &client, |event| events.push(event.clone())).expect("run");

    assert_eq!(outcome.turns_executed, 2);
    assert_eq!(
        outcome.stop,
        TurnStop::Completed {
            final_response: "Understood, I cannot install packages.".to_string()
        }
    );

    let calls = client.calls();
    assert_eq!(calls[1].last().expect("messages").content, DENIAL_MESSAGE);
    assert!(events.contains(&TurnEvent::ApprovalRequired(
        "sudo apt install x".to_string()
    )));
    assert!(events.contains(&TurnEvent::Denied {
        command: "sudo apt install x".to_string(),
        timed_out: true,
    }));
}

/// Scenario: an operator approves a dangerous command via the marker.
///
/// The approve marker is placed before the loop runs; the gate must
/// consume it, the command must execute, and its feedback must reach the
/// next completion call.
#[test]
fn approved_dangerous_command_executes() {
    let workspace = TestWorkspace::new().expect("workspace");
    let mut config = workspace.config.clone();
    config.hitl_enabled = true;
    workspace.approve();

    // `kill -0 $$` classifies as dangerous but is harmless: it only
    // probes the shell's own pid and produces no output.
    let client = ScriptedClient::new(["ACTION: EXECUTE\nCOMMAND: kill -0 $$", "done"]);

    let mut events = Vec::new();
    let outcome = run_turn(&config, &client, |event| events.push(event.clone())).expect("run");

    assert_eq!(outcome.turns_executed, 2);
    assert!(events.contains(&TurnEvent::Approved("kill -0 $$".to_string())));
    assert!(!config.approval.approve_marker.exists());

    let calls = client.calls();
    assert_eq!(
        calls[1].last().expect("messages").content,
        format!("{OUTPUT_PREFIX}\n{NO_OUTPUT_SENTINEL}")
    );
}

/// Scenario: five consecutive responses each request a command.
///
/// The loop must execute all five, then end at the turn ceiling even
/// though the fifth response still requested further action.
#[test]
fn turn_budget_bounds_a_command_hungry_model() {
    let workspace = TestWorkspace::new().expect("workspace");
    let config = workspace.config.clone();

    let responses: Vec<String> = (1..=5)
        .map(|i| format!("ACTION: EXECUTE\nCOMMAND: touch turn-{i}.txt"))
        .collect();
    let client = ScriptedClient::new(responses);

    let outcome = run_turn(&config, &client, |_| {}).expect("run");

    assert_eq!(outcome.turns_executed, 5);
    assert_eq!(outcome.stop, TurnStop::BudgetExhausted);
    assert_eq!(client.calls().len(), 5);
    for i in 1..=5 {
        assert!(
            config
                .workspace
                .work_dir
                .join(format!("turn-{i}.txt"))
                .is_file(),
            "turn {i} did not execute"
        );
    }
}

/// A malformed response (directive with no command field) ends the loop
/// exactly like a plain final response.
#[test]
fn malformed_directive_response_is_final_output() {
    let workspace = TestWorkspace::new().expect("workspace");
    let client = ScriptedClient::new(["ACTION: EXECUTE\nbut I forgot the command field"]);

    let outcome = run_turn(&workspace.config, &client, |_| {}).expect("run");

    assert_eq!(outcome.turns_executed, 1);
    assert!(matches!(outcome.stop, TurnStop::Completed { .. }));
}

/// Scratch state persists across turns within one run: a file written by
/// the first command is visible to the second.
#[test]
fn scratch_directory_is_not_reset_between_turns() {
    let workspace = TestWorkspace::new().expect("workspace");
    let client = ScriptedClient::new([
        "ACTION: EXECUTE\nCOMMAND: echo carried > state.txt",
        "ACTION: EXECUTE\nCOMMAND: cat state.txt",
        "finished",
    ]);

    let outcome = run_turn(&workspace.config, &client, |_| {}).expect("run");

    assert_eq!(outcome.turns_executed, 3);
    let calls = client.calls();
    assert_eq!(
        calls[2].last().expect("messages").content,
        format!("{OUTPUT_PREFIX}\ncarried\n")
    );
}
