//! Success signal model

use serde::{Deserialize, Serialize};

use holdfast_locator::{Locator, LocatorSet};

/// One piece of page evidence that counts toward a flow outcome.
///
/// Positive signals are OR-composed by the verifier. `CleanDeparture` is
/// the conjunctive fallback, consulted only when no positive signal fires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutcomeSignal {
    /// Current URL contains a substring (e.g. "/secure").
    UrlContains(String),

    /// Current URL matches a regular expression.
    UrlMatches(String),

    /// Page title contains a substring.
    TitleContains(String),

    /// Page title matches a regular expression.
    TitleMatches(String),

    /// A marker element resolves and is displayed.
    MarkerVisible { label: String, target: LocatorSet },

    /// A flash/notification element resolves and its text contains the
    /// needle. Matching is case-insensitive; flash banners vary casing
    /// across deployments.
    FlashContains { target: LocatorSet, needle: String },

    /// Fallback: the session left the originating page (URL no longer
    /// contains the origin fragment) and none of the error markers
    /// resolve to a visible element.
    CleanDeparture {
        origin_fragment: String,
        error_markers: LocatorSet,
    },
}

impl OutcomeSignal {
    /// Diagnostic label recorded in the verdict when this signal fires.
    pub fn label(&self) -> String {
        match self {
            OutcomeSignal::UrlContains(needle) => format!("url-contains:{needle}"),
            OutcomeSignal::UrlMatches(pattern) => format!("url-matches:{pattern}"),
            OutcomeSignal::TitleContains(needle) => format!("title-contains:{needle}"),
            OutcomeSignal::TitleMatches(pattern) => format!("title-matches:{pattern}"),
            OutcomeSignal::MarkerVisible { label, .. } => format!("marker:{label}"),
            OutcomeSignal::FlashContains { needle, .. } => format!("flash-contains:{needle}"),
            OutcomeSignal::CleanDeparture {
                origin_fragment, ..
            } => format!("clean-departure:{origin_fragment}"),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, OutcomeSignal::CleanDeparture { .. })
    }

    /// Flash signal against the conventional flash element, with the
    /// generic alert-role fallback the same pages use.
    pub fn flash(needle: impl Into<String>) -> Self {
        OutcomeSignal::FlashContains {
            target: flash_target(),
            needle: needle.into(),
        }
    }
}

/// Locator set for the conventional flash banner.
pub fn flash_target() -> LocatorSet {
    LocatorSet::new("flash message")
        .with(Locator::css("#flash"))
        .with(Locator::css("div[role='alert']"))
}

/// Locator set matching the usual inline validation error markers.
pub fn error_markers() -> LocatorSet {
    LocatorSet::new("validation errors")
        .with(Locator::css(".invalid-feedback"))
        .with(Locator::css(".alert-danger"))
        .with(Locator::css(".error"))
}

/// Final judgement over a signal list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub ok: bool,
    /// Labels of the signals that fired, in evaluation order.
    pub fired: Vec<String>,
}

impl Verdict {
    pub fn failure() -> Self {
        Self {
            ok: false,
            fired: Vec::new(),
        }
    }

    pub fn from_signal(signal: &OutcomeSignal) -> Self {
        Self {
            ok: true,
            fired: vec![signal.label()],
        }
    }
}
