//! Human-in-the-loop approval gate over filesystem markers.
//!
//! Operator tooling flips one of two marker files out-of-band; the gate
//! polls for them, consumes whichever appears first, and defaults to
//! denial when the ceiling elapses. How the operator flips a marker is
//! external to this crate; only the poll/consume/timeout contract lives
//! here.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, instrument, warn};

/// Outcome of one approval wait. Terminal for the pending command; the
/// orchestrator treats `TimedOut` identically to `Denied`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalDecision {
    Approved,
    Denied,
    TimedOut,
}

/// Polls approve/deny marker files for exactly one pending command.
///
/// Markers are checked approve-before-deny on every tick, a fixed order
/// that makes concurrent markers resolve deterministically.
#[derive(Debug, Clone)]
pub struct ApprovalGate {
    approve_marker: PathBuf,
    deny_marker: PathBuf,
    poll_interval: Duration,
    ceiling: Duration,
}

impl ApprovalGate {
    pub fn new(
        approve_marker: impl Into<PathBuf>,
        deny_marker: impl Into<PathBuf>,
        poll_interval: Duration,
        ceiling: Duration,
    ) -> Self {
        Self {
            approve_marker: approve_marker.into(),
            deny_marker: deny_marker.into(),
            poll_interval,
            ceiling,
        }
    }

    /// Block until a marker appears or the ceiling elapses.
    ///
    /// An observed marker is removed before the decision is returned, so
    /// a stale marker can never satisfy a later, unrelated wait.
    #[instrument(skip_all, fields(ceiling_secs = self.ceiling.as_secs()))]
    pub fn wait(&self) -> ApprovalDecision {
        let deadline = Instant::now() + self.ceiling;
        debug!(
            approve = %self.approve_marker.display(),
            deny = %self.deny_marker.display(),
            "waiting for approval markers"
        );
        loop {
            if consume_marker(&self.approve_marker) {
                debug!("approve marker observed");
                return ApprovalDecision::Approved;
            }
            if consume_marker(&self.deny_marker) {
                debug!("deny marker observed");
                return ApprovalDecision::Denied;
            }
            if Instant::now() >= deadline {
                warn!("approval wait timed out");
                return ApprovalDecision::TimedOut;
            }
            thread::sleep(self.poll_interval);
        }
    }
}

/// Check for a marker and clear it. The decision stands even if removal
/// fails; the leftover marker is reported instead of silently honored
/// again.
fn consume_marker(marker: &Path) -> bool {
    if !marker.exists() {
        return false;
    }
    if let Err(err) = fs::remove_file(marker) {
        warn!(marker = %marker.display(), err = %err, "failed to remove approval marker");
    }
    true
}
