//! Test-only doubles and fixtures for driving the turn loop without a
//! live orchestrator.

use std::fs;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::config::{AgentConfig, WorkspacePaths};
use crate::core::message::Message;
use crate::io::llm::CompletionClient;

/// Completion client returning predetermined responses in order.
///
/// Records the message snapshot of every call for assertions. Once the
/// script is exhausted it returns a plain-text response with no
/// directive, which ends the loop naturally.
pub struct ScriptedClient {
    responses: Mutex<Vec<String>>,
    calls: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedClient {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Message snapshots observed by each completion call, in order.
    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.lock().expect("calls lock").clone()
    }
}

impl CompletionClient for ScriptedClient {
    fn complete(&self, messages: &[Message], _agent_id: &str) -> String {
        self.calls
            .lock()
            .expect("calls lock")
            .push(messages.to_vec());
        let mut responses = self.responses.lock().expect("responses lock");
        if responses.is_empty() {
            "No further scripted responses.".to_string()
        } else {
            responses.remove(0)
        }
    }
}

/// Temp-directory workspace with a provisioned directory layout, marker
/// paths inside the temp directory, and timings shrunk for tests.
pub struct TestWorkspace {
    // Held for its Drop; the path must outlive the config that points
    // into it.
    _temp: tempfile::TempDir,
    pub config: AgentConfig,
}

impl TestWorkspace {
    pub fn new() -> Result<Self> {
        let temp = tempfile::tempdir().context("create tempdir")?;
        let mut config = AgentConfig::from_lookup(|_| None)?;
        config.workspace = WorkspacePaths::new(temp.path().join("workspace"));
        config.workspace.provision()?;
        config.approval.approve_marker = temp.path().join("approve.lock");
        config.approval.deny_marker = temp.path().join("deny.lock");
        config.approval.poll_interval = Duration::from_millis(10);
        config.approval.ceiling = Duration::from_millis(200);
        config.command_timeout = Duration::from_secs(10);
        config.user_msg = "do the thing".to_string();
        Ok(Self {
            _temp: temp,
            config,
        })
    }

    /// Place the approve marker, as operator tooling would.
    pub fn approve(&self) {
        fs::write(&self.config.approval.approve_marker, "").expect("write approve marker");
    }

    /// Place the deny marker, as operator tooling would.
    pub fn deny(&self) {
        fs::write(&self.config.approval.deny_marker, "").expect("write deny marker");
    }
}
