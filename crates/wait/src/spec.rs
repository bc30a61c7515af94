//! Wait budget specification

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use holdfast_core_types::SessionContext;

/// Timeout and poll interval for one wait.
///
/// Invariants are enforced at construction: both durations are positive
/// and the poll interval never exceeds the timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitSpec {
    pub timeout: Duration,
    pub poll: Duration,
}

impl WaitSpec {
    pub fn new(timeout: Duration, poll: Duration) -> Self {
        let timeout = timeout.max(Duration::from_millis(1));
        let poll = poll.max(Duration::from_millis(1)).min(timeout);
        Self { timeout, poll }
    }

    /// Budget taken from the context's caller-supplied defaults.
    pub fn from_context(ctx: &SessionContext) -> Self {
        Self::new(ctx.timeout, ctx.poll)
    }

    /// Short budget for opportunistic soft checks.
    pub fn short() -> Self {
        Self::new(Duration::from_secs(2), Duration::from_millis(100))
    }
}

impl Default for WaitSpec {
    fn default() -> Self {
        Self::new(
            holdfast_core_types::DEFAULT_TIMEOUT,
            holdfast_core_types::DEFAULT_POLL,
        )
    }
}

/// A wait deadline passed without the condition holding.
///
/// Soft by design: expected timeout paths (optional elements) branch on
/// this value; only callers that declared the wait required escalate it.
#[derive(Debug, Clone, Error)]
#[error("wait '{label}' timed out after {waited:?}")]
pub struct TimeoutFailure {
    /// Label of the condition that never held.
    pub label: String,
    /// Wall-clock time spent polling.
    pub waited: Duration,
}
