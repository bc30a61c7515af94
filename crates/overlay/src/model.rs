//! Overlay signal and mitigation state model

use serde::{Deserialize, Serialize};

use holdfast_locator::Locator;

/// One detection rule in the overlay catalogue. Static and read-only;
/// built once at startup and reused across calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OverlaySignal {
    /// URL fragment left behind by an interstitial (e.g. an ad vignette).
    UrlFragment { label: String, fragment: String },

    /// Overlay markup present in the DOM, visible or not.
    Present { label: String, locator: Locator },

    /// Overlay markup that is present and currently displayed.
    Visible { label: String, locator: Locator },
}

impl OverlaySignal {
    pub fn label(&self) -> &str {
        match self {
            OverlaySignal::UrlFragment { label, .. }
            | OverlaySignal::Present { label, .. }
            | OverlaySignal::Visible { label, .. } => label,
        }
    }
}

/// Mitigation state machine states, recorded in order in the report trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MitigationState {
    Idle,
    Detected,
    Dismissing,
    Verifying,
    Resolved,
    Unresolved,
}

/// Dismissal strategies in fixed priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DismissStrategy {
    /// Escape key to the active element, repeated a few times.
    EscapeKey,
    /// Click a recognized close control if one resolves and is visible.
    CloseControl,
    /// Scripted click on the overlay container (click-outside dismissal).
    ContainerClick,
    /// Remove matching nodes directly and clear overlay URL fragments.
    DomSurgery,
    /// Navigate to a known-clean URL as a last resort.
    CleanNavigation,
}

impl DismissStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            DismissStrategy::EscapeKey => "escape-key",
            DismissStrategy::CloseControl => "close-control",
            DismissStrategy::ContainerClick => "container-click",
            DismissStrategy::DomSurgery => "dom-surgery",
            DismissStrategy::CleanNavigation => "clean-navigation",
        }
    }

    pub fn escalation_order() -> [DismissStrategy; 5] {
        [
            DismissStrategy::EscapeKey,
            DismissStrategy::CloseControl,
            DismissStrategy::ContainerClick,
            DismissStrategy::DomSurgery,
            DismissStrategy::CleanNavigation,
        ]
    }
}

/// Final state of one mitigation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MitigationOutcome {
    Resolved,
    /// Something still matches after every strategy. Reported to the
    /// caller, which decides whether to proceed or fail.
    Unresolved,
}

/// What one mitigation pass saw and did.
#[derive(Debug, Clone)]
pub struct MitigationReport {
    pub outcome: MitigationOutcome,
    /// Labels of signals that matched on the initial scan.
    pub matched: Vec<String>,
    /// Strategies applied, in order, before the scan came back clean.
    pub applied: Vec<DismissStrategy>,
    /// State transitions taken, for diagnostics.
    pub trace: Vec<MitigationState>,
}

impl MitigationReport {
    pub fn is_resolved(&self) -> bool {
        self.outcome == MitigationOutcome::Resolved
    }
}
