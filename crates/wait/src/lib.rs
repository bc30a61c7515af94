//! Polling waits with composable readiness conditions
//!
//! Probe, sleep the poll interval, probe again until the condition holds
//! or the budget is spent. A timeout is a typed value, not a panic.

pub mod conditions;
pub mod coordinator;
pub mod spec;

pub use conditions::*;
pub use coordinator::*;
pub use spec::*;
