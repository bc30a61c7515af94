//! Hard failures surfaced by the action executor

use thiserror::Error;

use crate::model::ActionAttempt;

/// Action-level failure. Both variants are hard: transient per-tier
/// failures are swallowed inside the retry loop and only the final
/// attempt's failure is surfaced, labeled with the logical element and the
/// tiers that were exercised.
#[derive(Debug, Error)]
pub enum ActionError {
    /// Required element missing after the bounded retries.
    #[error("element not found: {label}")]
    ElementNotFound { label: String },

    /// Action ran but its post-condition never held across all tiers and
    /// retries.
    #[error("action verification failed for '{label}' (tiers attempted: {tiers})")]
    VerificationFailed {
        label: String,
        tiers: String,
        attempts: Vec<ActionAttempt>,
    },
}

impl ActionError {
    pub fn verification(label: impl Into<String>, attempts: Vec<ActionAttempt>) -> Self {
        let tiers = crate::model::ActionReport::tiers_attempted(&attempts);
        ActionError::VerificationFailed {
            label: label.into(),
            tiers,
            attempts,
        }
    }
}
