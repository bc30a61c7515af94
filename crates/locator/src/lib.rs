//! Element resolution with fallback-chain orchestration
//!
//! Every logical element is an ordered `LocatorSet`, resolved by walking
//! the candidates until one matches. A miss is a value, not an error;
//! callers decide severity.

pub mod resolver;
pub mod types;

pub use resolver::*;
pub use types::*;
