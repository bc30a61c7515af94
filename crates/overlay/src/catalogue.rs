//! Static overlay catalogue

use serde::{Deserialize, Serialize};

use holdfast_locator::{Locator, LocatorSet};

use crate::model::OverlaySignal;

/// Everything the guard knows about the overlays a site serves: detection
/// signals, where close controls tend to live, which containers to target
/// for click-outside dismissal and surgery, and an optional clean URL for
/// last-resort navigation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayCatalogue {
    pub signals: Vec<OverlaySignal>,
    pub close_controls: LocatorSet,
    pub containers: Vec<Locator>,
    pub clean_url: Option<String>,
    /// Escape presses per escape-key strategy application.
    pub escape_presses: u32,
}

impl OverlayCatalogue {
    pub fn new() -> Self {
        Self {
            signals: Vec::new(),
            close_controls: LocatorSet::new("overlay close control"),
            containers: Vec::new(),
            clean_url: None,
            escape_presses: 3,
        }
    }

    pub fn with_signal(mut self, signal: OverlaySignal) -> Self {
        self.signals.push(signal);
        self
    }

    pub fn with_close_control(mut self, locator: Locator) -> Self {
        self.close_controls.candidates.push(locator);
        self
    }

    pub fn with_container(mut self, locator: Locator) -> Self {
        self.containers.push(locator);
        self
    }

    pub fn with_clean_url(mut self, url: impl Into<String>) -> Self {
        self.clean_url = Some(url.into());
        self
    }

    /// Raw selectors targeted by the DOM-surgery script.
    pub fn surgery_selectors(&self) -> Vec<String> {
        let mut selectors: Vec<String> = self
            .containers
            .iter()
            .map(|locator| locator.query.clone())
            .collect();
        for signal in &self.signals {
            match signal {
                OverlaySignal::Present { locator, .. }
                | OverlaySignal::Visible { locator, .. } => {
                    if !selectors.contains(&locator.query) {
                        selectors.push(locator.query.clone());
                    }
                }
                OverlaySignal::UrlFragment { .. } => {}
            }
        }
        selectors
    }

    /// URL fragments that indicate an interstitial is (or was) active.
    pub fn overlay_fragments(&self) -> Vec<&str> {
        self.signals
            .iter()
            .filter_map(|signal| match signal {
                OverlaySignal::UrlFragment { fragment, .. } => Some(fragment.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Default for OverlayCatalogue {
    /// Catalogue for the ad stack the target site serves: vignette
    /// fragments, bootstrap-style modals, generic overlay/popup classes,
    /// ad containers and google ad iframes.
    fn default() -> Self {
        Self::new()
            .with_signal(OverlaySignal::UrlFragment {
                label: "ad-vignette".into(),
                fragment: "#google_vignette".into(),
            })
            .with_signal(OverlaySignal::UrlFragment {
                label: "ad-fragment".into(),
                fragment: "#ad".into(),
            })
            .with_signal(OverlaySignal::Visible {
                label: "modal".into(),
                locator: Locator::css(".modal"),
            })
            .with_signal(OverlaySignal::Visible {
                label: "overlay".into(),
                locator: Locator::css(".overlay"),
            })
            .with_signal(OverlaySignal::Visible {
                label: "popup".into(),
                locator: Locator::css(".popup"),
            })
            .with_signal(OverlaySignal::Visible {
                label: "modal-backdrop".into(),
                locator: Locator::css(".modal-backdrop"),
            })
            .with_signal(OverlaySignal::Present {
                label: "ad-container".into(),
                locator: Locator::css("[id*='ad-container']"),
            })
            .with_signal(OverlaySignal::Present {
                label: "ad-iframe".into(),
                locator: Locator::css("iframe[src*='google']"),
            })
            .with_signal(OverlaySignal::Visible {
                label: "consent-modal".into(),
                locator: Locator::css(".fc-consent-root"),
            })
            .with_close_control(Locator::css("button[aria-label='Close']"))
            .with_close_control(Locator::css("button[aria-label='close']"))
            .with_close_control(Locator::css(".modal-close"))
            .with_close_control(Locator::css("button.close"))
            .with_close_control(Locator::css("[data-dismiss='modal']"))
            .with_close_control(Locator::css("div[id*='ad'] button"))
            .with_container(Locator::css(".modal"))
            .with_container(Locator::css(".overlay"))
            .with_container(Locator::css(".popup"))
            .with_container(Locator::css(".modal-backdrop"))
            .with_container(Locator::css(".advertisement"))
    }
}
