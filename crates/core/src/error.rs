//! Session-level error types

use thiserror::Error;

/// Failure while talking to the live browser session.
///
/// These are transport/engine-level errors, not logical outcomes:
/// "no element matched" is a value elsewhere, never a `SessionError`.
#[derive(Debug, Error, Clone)]
pub enum SessionError {
    /// Selector could not be parsed by the query engine
    #[error("invalid selector: {selector}")]
    InvalidSelector { selector: String },

    /// Element handle no longer refers to a live node
    #[error("stale element: {id}")]
    StaleElement { id: String },

    /// Interaction dispatched but rejected (intercepted, obscured, detached)
    #[error("interaction failed: {reason}")]
    InteractionFailed { reason: String },

    /// Injected script raised or could not be evaluated
    #[error("script failed: {reason}")]
    ScriptFailed { reason: String },

    /// Underlying transport error
    #[error("session transport error: {reason}")]
    Transport { reason: String },
}

impl SessionError {
    /// Interaction-layer failures are worth retrying through another tier;
    /// a stale handle needs re-resolution instead.
    pub fn is_interaction(&self) -> bool {
        matches!(
            self,
            SessionError::InteractionFailed { .. } | SessionError::StaleElement { .. }
        )
    }
}
