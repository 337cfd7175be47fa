//! Subprocess execution seam.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{debug, warn};

use redub_core::DubError;

/// Captured output of a finished subprocess.
#[derive(Clone, Debug)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs external programs. No shell involved; arguments pass through
/// verbatim.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, DubError>;
}

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// Production runner backed by `tokio::process::Command`, with a hard
/// timeout that kills the child.
pub struct TokioCommandRunner {
    timeout: Duration,
}

impl TokioCommandRunner {
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for TokioCommandRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, DubError> {
        let start = Instant::now();
        debug!(program, ?args, "spawning process");

        let child = tokio::process::Command::new(program)
            .args(args)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| DubError::Processing(format!("failed to spawn {program}: {e}")))?;

        let wait = child.wait_with_output();
        match tokio::time::timeout(self.timeout, wait).await {
            Ok(result) => {
                let output = result
                    .map_err(|e| DubError::Processing(format!("{program} wait failed: {e}")))?;
                let exit_code = output.status.code().unwrap_or(-1);
                debug!(
                    program,
                    exit_code,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "process completed"
                );
                Ok(CommandOutput {
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                    exit_code,
                })
            }
            Err(_) => {
                // kill_on_drop reaps the child when the future is dropped.
                warn!(program, timeout_secs = self.timeout.as_secs(), "process timed out");
                Err(DubError::Processing(format!(
                    "{program} timed out after {}s",
                    self.timeout.as_secs()
                )))
            }
        }
    }
}
