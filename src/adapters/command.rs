use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Result, TelemetryError};
use crate::ports::CommandExecutor;

/// Non-interactive privilege-escalation wrapper tried on the retry.
const SUDO_BIN: &str = "sudo";

/// Runs external tools as child processes under a caller-supplied timeout.
///
/// Children are spawned with `kill_on_drop`, so a cancelled or timed-out
/// invocation reaps the process instead of leaking it.
#[derive(Debug, Clone, Default)]
pub struct SystemCommandRunner;

impl SystemCommandRunner {
    pub fn new() -> Self {
        Self
    }

    async fn spawn(&self, name: &str, args: &[&str], timeout: Duration) -> Result<String> {
        let output = tokio::process::Command::new(name)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(timeout, output).await {
            Ok(Ok(out)) => out,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TelemetryError::ToolUnavailable {
                    tool: name.to_string(),
                })
            }
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                return Err(TelemetryError::Timeout {
                    tool: name.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
        };

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if output.status.success() {
            Ok(combined)
        } else {
            Err(TelemetryError::CommandFailed {
                tool: name.to_string(),
                code: output.status.code(),
                output: combined,
            })
        }
    }
}

#[async_trait]
impl CommandExecutor for SystemCommandRunner {
    async fn run(&self, name: &str, args: &[&str], timeout: Duration) -> Result<String> {
        self.spawn(name, args, timeout).await
    }

    async fn run_privileged(
        &self,
        name: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<String> {
        let unprivileged = match self.spawn(name, args, timeout).await {
            Ok(out) => return Ok(out),
            Err(e) => e,
        };

        tracing::debug!(tool = name, error = %unprivileged, "unprivileged run failed, retrying escalated");

        // `sudo -n` fails immediately instead of prompting.
        let mut escalated_args = Vec::with_capacity(args.len() + 2);
        escalated_args.push("-n");
        escalated_args.push(name);
        escalated_args.extend_from_slice(args);

        match self.spawn(SUDO_BIN, &escalated_args, timeout).await {
            Ok(out) => Ok(out),
            Err(escalated) => Err(TelemetryError::PrivilegeDenied {
                tool: name.to_string(),
                unprivileged: Box::new(unprivileged),
                escalated: Box::new(escalated),
            }),
        }
    }
}
