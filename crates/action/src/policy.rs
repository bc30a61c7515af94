//! Executor policy knobs

use std::time::Duration;

use serde::{Deserialize, Serialize};

use holdfast_wait::WaitSpec;

/// Retry and readiness configuration for the action executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionPolicy {
    /// Full resolve-wait-act-verify rounds before giving up.
    pub max_attempts: u32,
    /// Pause between rounds.
    pub retry_pause: Duration,
    /// Budget for the pre-action readiness wait.
    pub readiness: WaitSpec,
    /// Budget for caller-supplied post-conditions.
    pub post_condition: WaitSpec,
}

impl Default for ActionPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_pause: Duration::from_millis(300),
            readiness: WaitSpec::default(),
            post_condition: WaitSpec::default(),
        }
    }
}

impl ActionPolicy {
    /// Tightened budgets for tests and opportunistic calls.
    pub fn fast() -> Self {
        Self {
            max_attempts: 3,
            retry_pause: Duration::from_millis(20),
            readiness: WaitSpec::new(Duration::from_millis(200), Duration::from_millis(50)),
            post_condition: WaitSpec::new(Duration::from_millis(200), Duration::from_millis(50)),
        }
    }
}
