//! Bounded execution of model-requested shell commands.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use tracing::{info, instrument, warn};

use crate::io::process::run_with_timeout;

/// Sentinel fed back when a command succeeds with no output.
pub const NO_OUTPUT_SENTINEL: &str = "Command executed successfully with no output.";
/// Prefix of the user-role feedback message carrying command output.
pub const OUTPUT_PREFIX: &str = "COMMAND_OUTPUT:";

/// Outcome of one command execution.
///
/// Produced once per executed command and consumed immediately via
/// [`ExecutionResult::render`] to build the next feedback message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Stdout followed by stderr, with truncation notices appended when
    /// the capture limit was hit.
    pub combined_output: String,
    pub timed_out: bool,
    /// Set when the command could not be launched at all.
    pub launch_error: Option<String>,
    timeout: Duration,
}

impl ExecutionResult {
    /// Fold the outcome into the single text payload appended to the
    /// message log as the command-output feedback message.
    pub fn render(&self) -> String {
        if let Some(err) = &self.launch_error {
            return format!("ERROR executing command: {err}");
        }
        if self.timed_out {
            let mut text = format!(
                "ERROR executing command: timed out after {}",
                render_timeout(self.timeout)
            );
            if !self.combined_output.trim().is_empty() {
                text.push_str("\nPartial output:\n");
                text.push_str(&self.combined_output);
            }
            return text;
        }
        if self.combined_output.trim().is_empty() {
            return format!("{OUTPUT_PREFIX}\n{NO_OUTPUT_SENTINEL}");
        }
        format!("{OUTPUT_PREFIX}\n{}", self.combined_output)
    }
}

/// Runs approved commands through a shell in the scratch directory.
///
/// The scratch directory is a persistent per-run scratchpad: commands
/// see each other's leftover state and it is never reset between
/// iterations.
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    shell: String,
    workdir: PathBuf,
    timeout: Duration,
    output_limit_bytes: usize,
}

impl ShellExecutor {
    pub fn new(
        shell: impl Into<String>,
        workdir: impl Into<PathBuf>,
        timeout: Duration,
        output_limit_bytes: usize,
    ) -> Self {
        Self {
            shell: shell.into(),
            workdir: workdir.into(),
            timeout,
            output_limit_bytes,
        }
    }

    /// Run `command` and capture its merged output.
    ///
    /// Never fails: non-zero exit is not an error and the exit code is
    /// not surfaced (the model only sees output text); launch failures
    /// and timeouts are folded into the result.
    #[instrument(skip_all, fields(timeout_secs = self.timeout.as_secs()))]
    pub fn run(&self, command: &str) -> ExecutionResult {
        info!(workdir = %self.workdir.display(), "executing command");
        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c").arg(command).current_dir(&self.workdir);

        match run_with_timeout(cmd, self.timeout, self.output_limit_bytes) {
            Ok(captured) => ExecutionResult {
                combined_output: merge_output(
                    &captured.stdout,
                    &captured.stderr,
                    captured.stdout_truncated,
                    captured.stderr_truncated,
                ),
                timed_out: captured.timed_out,
                launch_error: None,
                timeout: self.timeout,
            },
            Err(err) => {
                warn!(err = %err, "command launch failed");
                ExecutionResult {
                    combined_output: String::new(),
                    timed_out: false,
                    launch_error: Some(format!("{err:#}")),
                    timeout: self.timeout,
                }
            }
        }
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }
}

/// Whole-second ceilings render in seconds; anything finer renders in
/// milliseconds so a sub-second ceiling never reads as "0 seconds".
fn render_timeout(timeout: Duration) -> String {
    if timeout.subsec_nanos() == 0 {
        format!("{} seconds", timeout.as_secs())
    } else {
        format!("{} ms", timeout.as_millis())
    }
}

fn merge_output(
    stdout: &[u8],
    stderr: &[u8],
    stdout_truncated: usize,
    stderr_truncated: usize,
) -> String {
    let mut text = String::from_utf8_lossy(stdout).into_owned();
    if stdout_truncated > 0 {
        text.push_str(&format!("\n[stdout truncated {stdout_truncated} bytes]\n"));
    }
    if !stderr.is_empty() {
        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(&String::from_utf8_lossy(stderr));
    }
    if stderr_truncated > 0 {
        text.push_str(&format!("\n[stderr truncated {stderr_truncated} bytes]\n"));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn executor(workdir: &Path, timeout: Duration) -> ShellExecutor {
        ShellExecutor::new("sh", workdir, timeout, 10_000)
    }

    #[test]
    fn output_is_rendered_with_feedback_prefix() {
        let temp = tempfile::tempdir().expect("tempdir");
        let result = executor(temp.path(), Duration::from_secs(5)).run("echo hello");
        assert_eq!(result.render(), "COMMAND_OUTPUT:\nhello\n");
    }

    #[test]
    fn empty_output_yields_sentinel() {
        let temp = tempfile::tempdir().expect("tempdir");
        let result = executor(temp.path(), Duration::from_secs(5)).run("true");
        assert!(!result.timed_out);
        assert_eq!(
            result.render(),
            format!("{OUTPUT_PREFIX}\n{NO_OUTPUT_SENTINEL}")
        );
    }

    #[test]
    fn non_zero_exit_still_returns_output() {
        let temp = tempfile::tempdir().expect("tempdir");
        let result =
            executor(temp.path(), Duration::from_secs(5)).run("echo broken >&2; exit 3");
        assert!(result.launch_error.is_none());
        assert!(result.render().contains("broken"));
    }

    #[test]
    fn timeout_is_distinguishable_and_bounded() {
        let temp = tempfile::tempdir().expect("tempdir");
        let start = std::time::Instant::now();
        let result = executor(temp.path(), Duration::from_millis(100)).run("sleep 5");
        assert!(result.timed_out);
        assert!(start.elapsed() < Duration::from_secs(4));
        assert!(
            result
                .render()
                .starts_with("ERROR executing command: timed out after 100 ms")
        );
    }

    #[test]
    fn whole_second_timeout_renders_in_seconds() {
        let result = ExecutionResult {
            combined_output: String::new(),
            timed_out: true,
            launch_error: None,
            timeout: Duration::from_secs(120),
        };
        assert_eq!(
            result.render(),
            "ERROR executing command: timed out after 120 seconds"
        );
    }

    #[test]
    fn missing_shell_is_a_launch_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let result = ShellExecutor::new(
            "shell-that-does-not-exist",
            temp.path(),
            Duration::from_secs(1),
            10_000,
        )
        .run("echo hi");
        assert!(result.launch_error.is_some());
        assert!(result.render().starts_with("ERROR executing command:"));
    }

    #[test]
    fn commands_share_scratch_state_across_invocations() {
        let temp = tempfile::tempdir().expect("tempdir");
        let executor = executor(temp.path(), Duration::from_secs(5));
        executor.run("echo persisted > note.txt");
        let result = executor.run("cat note.txt");
        assert_eq!(result.render(), "COMMAND_OUTPUT:\npersisted\n");
    }
}
