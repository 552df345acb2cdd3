//! Process configuration resolved once at entry.
//!
//! Every path, toggle, ceiling, and identifier the loop needs is read
//! from the environment exactly once into [`AgentConfig`] and passed by
//! reference; nothing re-reads ambient process state mid-run. The lookup
//! is injectable so tests can feed values without mutating the process
//! environment.

use std::env;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use tracing::warn;

use crate::core::danger::DangerPolicy;
use crate::core::message::Message;

/// The four pre-agreed workspace directories.
///
/// Only `work/` (the persistent per-run scratchpad) is used by this
/// crate; the others are contracts with external delivery, upload, and
/// publishing mechanisms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspacePaths {
    pub root: PathBuf,
    pub out_dir: PathBuf,
    pub in_dir: PathBuf,
    pub work_dir: PathBuf,
    pub www_dir: PathBuf,
}

impl WorkspacePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            out_dir: root.join("out"),
            in_dir: root.join("in"),
            work_dir: root.join("work"),
            www_dir: root.join("www"),
            root,
        }
    }

    /// Create all four directories before the loop starts.
    pub fn provision(&self) -> Result<()> {
        for dir in [&self.out_dir, &self.in_dir, &self.work_dir, &self.www_dir] {
            fs::create_dir_all(dir)
                .with_context(|| format!("create workspace directory {}", dir.display()))?;
        }
        Ok(())
    }
}

/// Approval gate settings: marker paths plus poll timing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalConfig {
    pub approve_marker: PathBuf,
    pub deny_marker: PathBuf,
    pub poll_interval: Duration,
    pub ceiling: Duration,
}

/// Full configuration for one agent invocation.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Display name rendered into the system prompt (`AGENT_NAME`).
    pub agent_name: String,
    /// Role description rendered into the system prompt (`AGENT_ROLE`).
    pub agent_role: String,
    /// Identifier sent with every completion request (`AGENT_ID`).
    pub agent_id: String,
    /// Base URL of the completion proxy (`ORCHESTRATOR_URL`).
    pub orchestrator_url: String,
    /// The current user instruction (`USER_MSG`).
    pub user_msg: String,
    /// Pre-seeded prior conversation (`HISTORY`, base64-encoded JSON).
    pub history: Vec<Message>,
    /// Whether dangerous commands require operator approval
    /// (`HITL_ENABLED`).
    pub hitl_enabled: bool,
    /// Maximum loop iterations per invocation (`MAX_TURNS`).
    pub max_turns: u32,
    /// Hard wall-clock ceiling per executed command
    /// (`COMMAND_TIMEOUT_SECS`).
    pub command_timeout: Duration,
    /// Bounded timeout for each completion request
    /// (`REQUEST_TIMEOUT_SECS`).
    pub request_timeout: Duration,
    /// Per-stream capture limit for command output
    /// (`OUTPUT_LIMIT_BYTES`).
    pub output_limit_bytes: usize,
    /// Shell used to interpret commands (`AGENT_SHELL`).
    pub shell: String,
    /// Denylist routing commands through the approval gate. Not
    /// environment-configurable; library callers replace it directly.
    pub danger_policy: DangerPolicy,
    pub approval: ApprovalConfig,
    pub workspace: WorkspacePaths,
}

impl AgentConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let workspace_root =
            lookup("WORKSPACE_DIR").unwrap_or_else(|| "/app/workspace".to_string());
        let config = Self {
            agent_name: lookup("AGENT_NAME").unwrap_or_else(|| "Agent".to_string()),
            agent_role: lookup("AGENT_ROLE").unwrap_or_else(|| "Assistant".to_string()),
            agent_id: lookup("AGENT_ID").unwrap_or_else(|| "0".to_string()),
            orchestrator_url: lookup("ORCHESTRATOR_URL")
                .unwrap_or_else(|| "http://172.17.0.1:3000".to_string()),
            user_msg: lookup("USER_MSG").unwrap_or_default(),
            history: lookup("HISTORY")
                .map(|raw| decode_history(&raw))
                .unwrap_or_default(),
            hitl_enabled: lookup("HITL_ENABLED").as_deref() == Some("true"),
            max_turns: parse_or("MAX_TURNS", &lookup, 5)?,
            command_timeout: Duration::from_secs(parse_or("COMMAND_TIMEOUT_SECS", &lookup, 120)?),
            request_timeout: Duration::from_secs(parse_or("REQUEST_TIMEOUT_SECS", &lookup, 120)?),
            output_limit_bytes: parse_or("OUTPUT_LIMIT_BYTES", &lookup, 100_000)?,
            shell: lookup("AGENT_SHELL").unwrap_or_else(|| "sh".to_string()),
            danger_policy: DangerPolicy::default(),
            approval: ApprovalConfig {
                approve_marker: lookup("APPROVE_MARKER")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("/tmp/agent_approval.lock")),
                deny_marker: lookup("DENY_MARKER")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("/tmp/agent_deny.lock")),
                poll_interval: Duration::from_secs(parse_or("APPROVAL_POLL_SECS", &lookup, 1)?),
                ceiling: Duration::from_secs(parse_or("APPROVAL_CEILING_SECS", &lookup, 600)?),
            },
            workspace: WorkspacePaths::new(workspace_root),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.orchestrator_url.trim().is_empty() {
            return Err(anyhow!("ORCHESTRATOR_URL must not be empty"));
        }
        if self.max_turns == 0 {
            return Err(anyhow!("MAX_TURNS must be > 0"));
        }
        if self.command_timeout.is_zero() {
            return Err(anyhow!("COMMAND_TIMEOUT_SECS must be > 0"));
        }
        if self.request_timeout.is_zero() {
            return Err(anyhow!("REQUEST_TIMEOUT_SECS must be > 0"));
        }
        if self.output_limit_bytes == 0 {
            return Err(anyhow!("OUTPUT_LIMIT_BYTES must be > 0"));
        }
        if self.shell.trim().is_empty() {
            return Err(anyhow!("AGENT_SHELL must not be empty"));
        }
        if self.approval.approve_marker == self.approval.deny_marker {
            return Err(anyhow!("approve and deny markers must be distinct paths"));
        }
        Ok(())
    }
}

fn parse_or<T: FromStr>(
    key: &str,
    lookup: &impl Fn(&str) -> Option<String>,
    default: T,
) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().with_context(|| format!("parse {key}")),
        None => Ok(default),
    }
}

/// Decode the pre-seeded history blob (base64-wrapped JSON array of
/// messages). An undecodable blob degrades to an empty history rather
/// than aborting the run.
fn decode_history(raw: &str) -> Vec<Message> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    let bytes = match BASE64.decode(trimmed) {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(err = %err, "HISTORY is not valid base64, starting with empty history");
            return Vec::new();
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(history) => history,
        Err(err) => {
            warn!(err = %err, "HISTORY did not parse as a message array, starting with empty history");
            Vec::new()
        }
    }
}
