use thiserror::Error;

/// Conditions that end a prefill run. Per-field and per-attachment problems
/// never surface here; they are folded into the `PrefillLog`.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Wrong, expired or already-used token. The service does not say which.
    #[error("Unauthorized: the token is invalid, expired or already used")]
    Unauthorized,

    #[error("Intent not found")]
    NotFound,

    #[error("Could not reach the prefill API: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Prefill API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Could not launch browser: {0}")]
    BrowserLaunch(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    /// The run finished but the service refused the log, so nothing was recorded.
    #[error("Report rejected: the token expired or the intent was already reported")]
    ReportRejected,
}
