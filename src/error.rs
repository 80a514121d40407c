use crate::CallAttempt;

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum CoachError {
    /// Non-retryable HTTP status returned by the provider, with raw body.
    #[error("upstream error {status}: {body}")]
    Upstream { status: u16, body: String },
    /// Every attempt allowed by the retry policy failed.
    #[error("retries exhausted after {} attempts", .attempts.len())]
    RetriesExhausted {
        /// Outcome of each attempt, in order.
        attempts: Vec<CallAttempt>,
    },
    /// Provider answered 2xx but the body (or the model's JSON) could not be decoded.
    #[error("response parse error: {0}")]
    ResponseParse(String),
    /// Speech-to-text stage failed.
    #[error("transcription failed: {0}")]
    Transcription(String),
    /// Text generation stage failed.
    #[error("generation failed: {0}")]
    Generation(String),
    /// Outbound request could not be assembled.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// Configuration missing or malformed.
    #[error("config error: {0}")]
    Config(String),
}

impl CoachError {
    /// Returns `true` for the failure kinds raised by the retrying client itself.
    pub fn is_call_failure(&self) -> bool {
        matches!(
            self,
            Self::Upstream { .. } | Self::RetriesExhausted { .. } | Self::ResponseParse(_)
        )
    }
}
