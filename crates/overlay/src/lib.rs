//! Overlay detection and escalating dismissal
//!
//! Scans a static signal catalogue and walks dismissal strategies from
//! cheap (escape key, close control) to aggressive (DOM surgery, clean
//! navigation). An overlay that survives everything is reported, not
//! raised.

pub mod catalogue;
pub mod guard;
pub mod model;

pub use catalogue::*;
pub use guard::*;
pub use model::*;
