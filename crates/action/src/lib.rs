//! Multi-tier action execution with post-condition verification
//!
//! Native interaction first, scripted when hit-testing rejects input,
//! keyboard fallback for submit-class actions. Bounded retries; only the
//! last attempt's failure surfaces.

pub mod errors;
pub mod executor;
pub mod model;
pub mod policy;

pub use errors::*;
pub use executor::*;
pub use model::*;
pub use policy::*;
