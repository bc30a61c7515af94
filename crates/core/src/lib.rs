//! Shared primitives for the holdfast interaction engine
//!
//! The `SessionPort` boundary trait, the `SessionContext` threaded through
//! every engine call, session-level errors, and the feature-gated test
//! fake. The engine never owns the session lifetime.

pub mod context;
pub mod error;
pub mod port;

#[cfg(feature = "testkit")]
pub mod testkit;

pub use context::*;
pub use error::*;
pub use port::*;
