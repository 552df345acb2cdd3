//! Advisory triage of commands before execution.

/// Leading-token denylist deciding which commands need operator
/// approval.
///
/// This is triage, not a security boundary: a dangerous classification
/// never blocks execution on its own, it only routes the command to the
/// approval gate when HITL mode is enabled.
#[derive(Debug, Clone)]
pub struct DangerPolicy {
    denylist: Vec<String>,
}

impl Default for DangerPolicy {
    fn default() -> Self {
        // Destructive file removal, privilege escalation, host/process
        // control, network probing, and agent spawning.
        Self::new(
            [
                "rm",
                "sudo",
                "su",
                "shutdown",
                "reboot",
                "nmap",
                "kill",
                "docker",
                "spawn_agent",
            ]
            .iter()
            .map(ToString::to_string)
            .collect(),
        )
    }
}

impl DangerPolicy {
    pub fn new(denylist: Vec<String>) -> Self {
        Self { denylist }
    }

    /// Whether the command's first token equals or extends a denylist
    /// entry. An empty command is not dangerous (callers already guard
    /// against empty commands reaching execution).
    pub fn is_dangerous(&self, command: &str) -> bool {
        let Some(first) = command.trim().split_whitespace().next() else {
            return false;
        };
        self.denylist.iter().any(|entry| first.starts_with(entry.as_str()))
    }
}
