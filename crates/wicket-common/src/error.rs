//! Common error types for Wicket components.

use thiserror::Error;

/// Infrastructure failures surfaced by the challenge engine.
///
/// Flow-level outcomes (wrong code, expired code, throttled resend) are not
/// errors; they are [`crate::types::FlowTransition`] variants. This type
/// covers the cases where the engine itself could not do its job.
#[derive(Debug, Error)]
pub enum WicketError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Attempt store read/write error
    #[error("Attempt store error: {0}")]
    Store(String),

    /// Stored record could not be encoded or decoded
    #[error("Record codec error: {0}")]
    Codec(String),

    /// Internal invariant violation
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WicketError {
    /// Returns true if the operation may succeed when retried
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}

impl From<serde_json::Error> for WicketError {
    fn from(err: serde_json::Error) -> Self {
        Self::Codec(err.to_string())
    }
}
