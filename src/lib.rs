//! Resilient UI interaction and popup mitigation engine
//!
//! Drives flows against unstable, ad-funded frontends: fallback-chain
//! element resolution, bounded polling waits, multi-tier actions with
//! verification, escalating overlay dismissal, and evidence-based outcome
//! checks. [`Engine`] assembles the component crates around one
//! [`SessionContext`]; bring your own [`SessionPort`] implementation.
//! The in-memory `testkit::FakeSession` (behind the core crate's
//! `testkit` feature) covers tests.

pub mod engine;

pub use engine::Engine;

pub use holdfast_core_types::{
    ElementHandle, Key, SessionContext, SessionError, SessionPort, DEFAULT_POLL, DEFAULT_TIMEOUT,
};
pub use holdfast_locator::{
    resolve, Locator, LocatorKind, LocatorSet, ResolvedElement, Resolution,
};
pub use holdfast_wait::{
    wait_for, wait_for_default, AnyOf, Clickable, Condition, ConditionHit, DocumentReady, Gone,
    NetworkIdle, Present, ScriptTruthy, TimeoutFailure, UrlContains, Visible, WaitSpec,
};
pub use holdfast_action::{
    perform, perform_with, ActionError, ActionKind, ActionPolicy, ActionReport, ActionRequest,
    Tier,
};
pub use holdfast_overlay::{
    DismissStrategy, MitigationOutcome, MitigationReport, MitigationState, OverlayCatalogue,
    OverlayGuard, OverlaySignal,
};
pub use holdfast_outcome::{error_markers, flash_target, verify_success, OutcomeSignal, Verdict};
