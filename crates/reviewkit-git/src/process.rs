use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{debug, trace};

/// Default deadline for a single external command
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(60);

/// Output captured from one external command invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    /// Set when the process was killed at the deadline
    #[serde(default)]
    pub timed_out: bool,
}

impl ProcessResult {
    pub fn new(stdout: String, stderr: String, exit_code: i32) -> Self {
        Self {
            stdout,
            stderr,
            exit_code,
            timed_out: false,
        }
    }

    /// A process that could not be launched at all
    pub fn launch_failure(reason: impl Into<String>) -> Self {
        Self::new(String::new(), reason.into(), 1)
    }

    /// A process that was force-terminated at its deadline
    pub fn timeout(limit: Duration) -> Self {
        Self {
            stdout: String::new(),
            stderr: format!("Command timed out after {}s", limit.as_secs()),
            exit_code: 1,
            timed_out: true,
        }
    }

    /// Check if the command exited successfully
    pub fn success(&self) -> bool {
        self.exit_code == 0 && !self.timed_out
    }
}

/// Runs external commands with a deadline, never failing hard
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    timeout: Duration,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Spawn `binary` with `args`, wait for it and capture both streams.
    ///
    /// Launch failures and timeouts are folded into the returned
    /// [`ProcessResult`] with exit code 1; a non-zero exit is not an error.
    pub async fn run(&self, binary: &str, args: &[&str], working_dir: Option<&Path>) -> ProcessResult {
        let start = Instant::now();

        debug!(
            binary,
            args = ?args,
            working_dir = ?working_dir.map(|d| d.display().to_string()),
            "Spawning process"
        );

        let mut cmd = Command::new(binary);
        cmd.args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(Stdio::null())
            .kill_on_drop(true);

        if let Some(dir) = working_dir {
            cmd.current_dir(dir);
        }

        let child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                debug!(binary, error = %e, "Failed to launch process");
                return ProcessResult::launch_failure(e.to_string());
            }
        };

        // Dropping the pending future on timeout drops the child, which kills it.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return ProcessResult::launch_failure(e.to_string()),
            Err(_) => {
                debug!(binary, timeout_secs = self.timeout.as_secs(), "Process timed out");
                return ProcessResult::timeout(self.timeout);
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let exit_code = output.status.code().unwrap_or(-1);

        trace!(stdout_len = stdout.len(), stderr_len = stderr.len(), "Captured output");
        debug!(
            exit_code,
            duration_ms = start.elapsed().as_millis(),
            "Process completed"
        );

        ProcessResult::new(stdout, stderr, exit_code)
    }
}
