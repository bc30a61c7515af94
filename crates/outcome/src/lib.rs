//! Outcome verification from independent page evidence
//!
//! Success signals (landing URL, flash message, marker element) are
//! OR-composed; any one positive hit is enough. A conjunctive
//! clean-departure fallback covers redirects that leave no positive
//! marker behind.

pub mod signal;
pub mod verifier;

pub use signal::*;
pub use verifier::*;
