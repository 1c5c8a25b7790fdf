use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// Port for running external diagnostic tools.
///
/// Every invocation is bounded by a caller-supplied timeout and must never
/// leak a child process past cancellation.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run a tool and return its combined stdout+stderr. A non-zero exit is
    /// an error, but the combined output is kept on it because diagnostic
    /// tools often emit a usable report alongside a failing exit code.
    async fn run(&self, name: &str, args: &[&str], timeout: Duration) -> Result<String>;

    /// Run unprivileged first; on failure retry once through the
    /// non-interactive privilege-escalation wrapper. Never prompts. If both
    /// attempts fail the error names both underlying failures.
    async fn run_privileged(&self, name: &str, args: &[&str], timeout: Duration)
        -> Result<String>;
}
