use thiserror::Error;

/// Collection-layer error taxonomy.
///
/// Failures are isolated per device and per metric: one disk's probe failing
/// must never abort the batch, and one metric failing must never block the
/// rest of a stats sample. Callers therefore match on these variants to
/// decide between degrading a single field and surfacing a hard error.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The external binary is not installed or not reachable via PATH.
    #[error("tool unavailable: {tool}")]
    ToolUnavailable { tool: String },

    /// The tool ran but exited non-zero. Combined stdout+stderr is kept
    /// because diagnostic tools often emit a usable report alongside a
    /// non-zero exit code.
    #[error("{tool} exited with {code:?}")]
    CommandFailed {
        tool: String,
        code: Option<i32>,
        output: String,
    },

    /// Both the unprivileged and the escalated attempt failed.
    #[error("{tool} denied: unprivileged: {unprivileged}; escalated: {escalated}")]
    PrivilegeDenied {
        tool: String,
        unprivileged: Box<TelemetryError>,
        escalated: Box<TelemetryError>,
    },

    /// The tool's run was cancelled by the caller-supplied deadline.
    #[error("{tool} timed out after {timeout_ms}ms")]
    Timeout { tool: String, timeout_ms: u64 },

    /// An expected field was absent from otherwise readable input.
    #[error("incomplete data: {0}")]
    ParseIncomplete(String),

    /// A CPU sampling window produced a zero total delta; the percentage is
    /// undefined and must not be reported as 0% or 100%.
    #[error("cpu sample window produced no counter movement")]
    SampleWindowInvalid,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl TelemetryError {
    /// Combined output captured from a failed run, if the tool produced any.
    /// A privileged retry prefers the escalated attempt's output but falls
    /// back to whatever the unprivileged run emitted, since a tool can print
    /// a full report and still exit non-zero.
    pub fn partial_output(&self) -> Option<&str> {
        match self {
            TelemetryError::CommandFailed { output, .. } if !output.is_empty() => Some(output),
            TelemetryError::PrivilegeDenied {
                unprivileged,
                escalated,
                ..
            } => escalated
                .partial_output()
                .or_else(|| unprivileged.partial_output()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TelemetryError>;
