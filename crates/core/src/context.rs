//! Session context threaded through every engine call

use std::sync::Arc;
use std::time::Duration;

use crate::port::SessionPort;

/// Default explicit-wait budget.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default interval between wait polls.
pub const DEFAULT_POLL: Duration = Duration::from_millis(250);

/// Wraps the live session handle with caller-supplied wait defaults.
///
/// Read-mostly and cheap to clone; one session maps to exactly one logical
/// thread of control, so no interior locking is needed here. Replaces
/// ambient thread-local driver lookup with an explicit value.
#[derive(Clone)]
pub struct SessionContext {
    pub port: Arc<dyn SessionPort>,
    pub timeout: Duration,
    pub poll: Duration,
}

impl SessionContext {
    pub fn new(port: Arc<dyn SessionPort>) -> Self {
        Self {
            port,
            timeout: DEFAULT_TIMEOUT,
            poll: DEFAULT_POLL,
        }
    }

    /// Override the default wait budget for this context.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the poll interval for this context.
    pub fn with_poll(mut self, poll: Duration) -> Self {
        self.poll = poll;
        self
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("timeout", &self.timeout)
            .field("poll", &self.poll)
            .finish_non_exhaustive()
    }
}
