//! Mitigation state machine

use tracing::{debug, info, warn};
use url::Url;

use holdfast_core_types::{Key, SessionContext, SessionError};
use holdfast_locator::{resolve, Resolution};

use crate::catalogue::OverlayCatalogue;
use crate::model::{
    DismissStrategy, MitigationOutcome, MitigationReport, MitigationState, OverlaySignal,
};

/// Drives overlay detection and dismissal for one session.
///
/// Stateless between calls: each `mitigate` pass runs the machine from
/// `Idle` and reports its trace. Calling it on a clean session is a no-op
/// that resolves immediately, so callers invoke it opportunistically
/// around risky actions.
pub struct OverlayGuard {
    catalogue: OverlayCatalogue,
}

impl OverlayGuard {
    pub fn new(catalogue: OverlayCatalogue) -> Self {
        Self { catalogue }
    }

    pub fn catalogue(&self) -> &OverlayCatalogue {
        &self.catalogue
    }

    /// One full pass: scan, dismiss with escalating strategies, re-verify.
    pub async fn mitigate(&self, ctx: &SessionContext) -> Result<MitigationReport, SessionError> {
        let mut trace = vec![MitigationState::Idle];
        let matched = self.scan(ctx).await;

        if matched.is_empty() {
            trace.push(MitigationState::Resolved);
            return Ok(MitigationReport {
                outcome: MitigationOutcome::Resolved,
                matched,
                applied: Vec::new(),
                trace,
            });
        }

        info!(signals = ?matched, "overlay detected");
        trace.push(MitigationState::Detected);
        trace.push(MitigationState::Dismissing);

        let mut applied = Vec::new();
        for strategy in DismissStrategy::escalation_order() {
            debug!(strategy = strategy.name(), "applying dismissal strategy");
            if let Err(err) = self.apply(ctx, strategy).await {
                warn!(strategy = strategy.name(), error = %err, "dismissal strategy errored");
            }
            applied.push(strategy);

            if self.scan(ctx).await.is_empty() {
                debug!(strategy = strategy.name(), "scan clean after strategy");
                break;
            }
        }

        trace.push(MitigationState::Verifying);
        let remaining = self.scan(ctx).await;
        let outcome = if remaining.is_empty() {
            info!(applied = applied.len(), "overlays dismissed");
            trace.push(MitigationState::Resolved);
            MitigationOutcome::Resolved
        } else {
            warn!(remaining = ?remaining, "overlays survived every strategy");
            trace.push(MitigationState::Unresolved);
            MitigationOutcome::Unresolved
        };

        Ok(MitigationReport {
            outcome,
            matched,
            applied,
            trace,
        })
    }

    /// Scan the signal catalogue; returns labels of matching signals.
    /// Detection errors on individual signals are tolerated — a broken
    /// probe must not block mitigation of the others.
    async fn scan(&self, ctx: &SessionContext) -> Vec<String> {
        let mut matched = Vec::new();
        for signal in &self.catalogue.signals {
            let hit = match signal {
                OverlaySignal::UrlFragment { fragment, .. } => {
                    match ctx.port.current_url().await {
                        Ok(url) => url.contains(fragment.as_str()),
                        Err(err) => {
                            debug!(signal = signal.label(), error = %err, "url probe failed");
                            false
                        }
                    }
                }
                OverlaySignal::Present { locator, .. } => {
                    match ctx.port.query(&locator.query).await {
                        Ok(handles) => !handles.is_empty(),
                        Err(err) => {
                            debug!(signal = signal.label(), error = %err, "presence probe failed");
                            false
                        }
                    }
                }
                OverlaySignal::Visible { locator, .. } => {
                    match ctx.port.query(&locator.query).await {
                        Ok(handles) => {
                            let mut any_visible = false;
                            for handle in handles {
                                if ctx.port.is_displayed(&handle).await.unwrap_or(false) {
                                    any_visible = true;
                                    break;
                                }
                            }
                            any_visible
                        }
                        Err(err) => {
                            debug!(signal = signal.label(), error = %err, "visibility probe failed");
                            false
                        }
                    }
                }
            };
            if hit {
                matched.push(signal.label().to_string());
            }
        }
        matched
    }

    async fn apply(
        &self,
        ctx: &SessionContext,
        strategy: DismissStrategy,
    ) -> Result<(), SessionError> {
        match strategy {
            DismissStrategy::EscapeKey => {
                for _ in 0..self.catalogue.escape_presses {
                    ctx.port.press_key(Key::Escape).await?;
                }
                Ok(())
            }
            DismissStrategy::CloseControl => {
                if let Resolution::Found(resolved) =
                    resolve(ctx, &self.catalogue.close_controls).await
                {
                    if ctx.port.is_displayed(&resolved.handle).await? {
                        return ctx.port.click(&resolved.handle).await;
                    }
                }
                Ok(())
            }
            DismissStrategy::ContainerClick => {
                for container in &self.catalogue.containers {
                    let handles = match ctx.port.query(&container.query).await {
                        Ok(handles) => handles,
                        Err(_) => continue,
                    };
                    if let Some(handle) = handles.first() {
                        // Scripted click: the container itself is what
                        // intercepts native input.
                        ctx.port.click_js(handle).await?;
                        return Ok(());
                    }
                }
                Ok(())
            }
            DismissStrategy::DomSurgery => {
                let script = surgery_script(&self.catalogue.surgery_selectors());
                ctx.port.run_script(&script).await?;
                self.clear_overlay_fragment(ctx).await
            }
            DismissStrategy::CleanNavigation => {
                if let Some(clean) = &self.catalogue.clean_url {
                    ctx.port.navigate(clean).await?;
                }
                Ok(())
            }
        }
    }

    /// Strip an overlay-indicating fragment from the current URL.
    async fn clear_overlay_fragment(&self, ctx: &SessionContext) -> Result<(), SessionError> {
        let current = ctx.port.current_url().await?;
        if !self
            .catalogue
            .overlay_fragments()
            .iter()
            .any(|fragment| current.contains(fragment))
        {
            return Ok(());
        }
        let stripped = match Url::parse(&current) {
            Ok(mut parsed) => {
                parsed.set_fragment(None);
                parsed.to_string()
            }
            // Not parseable; fall back to a plain split.
            Err(_) => current.split('#').next().unwrap_or("").to_string(),
        };
        if stripped != current && !stripped.is_empty() {
            debug!(url = %stripped, "clearing overlay url fragment");
            ctx.port.navigate(&stripped).await?;
        }
        Ok(())
    }
}

/// One idempotent script: remove catalogued overlay nodes and hide
/// anything stacked implausibly high. Safe to run on a clean page and
/// safe to run twice — the session offers no way to abort it mid-flight.
fn surgery_script(selectors: &[String]) -> String {
    let list = selectors
        .iter()
        .map(|s| format!("'{}'", s.replace('\'', "\\'")))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        r#"(() => {{
    const selectors = [{list}];
    selectors.forEach(sel => {{
        document.querySelectorAll(sel).forEach(el => el.remove());
    }});
    document.querySelectorAll('body *').forEach(el => {{
        const z = parseInt(window.getComputedStyle(el).zIndex, 10);
        if (z > 1000) {{ el.style.display = 'none'; }}
    }});
    return true;
}})()"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use holdfast_core_types::testkit::{FakeElement, FakeSession};
    use holdfast_locator::Locator;
    use std::sync::Arc;

    fn ctx(session: Arc<FakeSession>) -> SessionContext {
        SessionContext::new(session)
    }

    #[tokio::test]
    async fn test_clean_session_resolves_without_side_effects() {
        let session = Arc::new(FakeSession::new("https://example.test/register", "Register"));
        let guard = OverlayGuard::new(OverlayCatalogue::default());
        let ctx = ctx(session.clone());

        let report = guard.mitigate(&ctx).await.unwrap();
        assert!(report.is_resolved());
        assert!(report.applied.is_empty());
        assert_eq!(
            report.trace,
            vec![MitigationState::Idle, MitigationState::Resolved]
        );
        assert_eq!(session.escape_count(), 0);
        assert!(session.script_log().is_empty());
    }

    #[tokio::test]
    async fn test_mitigate_is_idempotent() {
        let session = Arc::new(FakeSession::new("https://example.test/register", "Register"));
        session.add_element(FakeElement::new("vignette").matching([".modal"]).as_overlay());
        session.dismiss_overlays_after_escapes(1);
        let guard = OverlayGuard::new(OverlayCatalogue::default());
        let ctx = ctx(session.clone());

        let first = guard.mitigate(&ctx).await.unwrap();
        assert!(first.is_resolved());
        assert_eq!(first.applied, vec![DismissStrategy::EscapeKey]);

        let escapes_after_first = session.escape_count();
        let second = guard.mitigate(&ctx).await.unwrap();
        assert!(second.is_resolved());
        assert!(second.applied.is_empty());
        assert_eq!(session.escape_count(), escapes_after_first);
    }

    #[tokio::test]
    async fn test_close_control_strategy_clicks_visible_control() {
        let session = Arc::new(FakeSession::new("https://example.test/register", "Register"));
        session.add_element(FakeElement::new("consent").matching([".modal"]).as_overlay());
        session.add_element(
            FakeElement::new("x-button")
                .matching(["button[aria-label='Close']"])
                .dismissing_overlays_on_click(),
        );
        let guard = OverlayGuard::new(OverlayCatalogue::default());
        let ctx = ctx(session.clone());

        let report = guard.mitigate(&ctx).await.unwrap();
        assert!(report.is_resolved());
        assert_eq!(
            report.applied,
            vec![DismissStrategy::EscapeKey, DismissStrategy::CloseControl]
        );
        assert_eq!(session.matching_count(".modal"), 0);
    }

    #[tokio::test]
    async fn test_dom_surgery_removes_stubborn_overlay() {
        let session = Arc::new(FakeSession::new(
            "https://example.test/register#google_vignette",
            "Register",
        ));
        // No close control, escapes ignored, container clicks rejected.
        session.add_element(
            FakeElement::new("iframe-ad")
                .matching(["iframe[src*='google']", ".advertisement"])
                .rejecting_scripted_clicks()
                .as_overlay(),
        );
        let guard = OverlayGuard::new(OverlayCatalogue::default());
        let ctx = ctx(session.clone());

        let report = guard.mitigate(&ctx).await.unwrap();
        assert!(report.is_resolved());
        assert!(report.applied.contains(&DismissStrategy::DomSurgery));
        assert_eq!(session.matching_count("iframe[src*='google']"), 0);
        // Fragment stripped by the surgery step.
        assert_eq!(session.url(), "https://example.test/register");
    }

    #[tokio::test]
    async fn test_clean_navigation_is_last_resort() {
        let session = Arc::new(FakeSession::new(
            "https://example.test/register#google_vignette",
            "Register",
        ));
        session.fail_scripts(true);
        let guard = OverlayGuard::new(
            OverlayCatalogue::default().with_clean_url("https://example.test/register"),
        );
        let ctx = ctx(session.clone());

        let report = guard.mitigate(&ctx).await.unwrap();
        assert!(report.is_resolved());
        assert_eq!(report.applied.len(), 5);
        assert_eq!(
            session.navigation_log(),
            vec!["https://example.test/register".to_string()]
        );
    }

    #[tokio::test]
    async fn test_surviving_overlay_reported_unresolved_not_raised() {
        let session = Arc::new(FakeSession::new(
            "https://example.test/register#google_vignette",
            "Register",
        ));
        session.fail_scripts(true);
        // No clean URL configured; the fragment can never be cleared.
        let guard = OverlayGuard::new(OverlayCatalogue::default());
        let ctx = ctx(session.clone());

        let report = guard.mitigate(&ctx).await.unwrap();
        assert_eq!(report.outcome, MitigationOutcome::Unresolved);
        assert_eq!(report.applied.len(), 5);
        assert_eq!(*report.trace.last().unwrap(), MitigationState::Unresolved);
    }

    #[tokio::test]
    async fn test_custom_catalogue_signal_detection() {
        let session = Arc::new(FakeSession::new("https://example.test", "Home"));
        session.add_element(FakeElement::new("banner").matching(["#promo"]).as_overlay());
        session.dismiss_overlays_after_escapes(1);
        let guard = OverlayGuard::new(OverlayCatalogue::new().with_signal(
            OverlaySignal::Visible {
                label: "promo-banner".into(),
                locator: Locator::css("#promo"),
            },
        ));
        let ctx = ctx(session.clone());

        let report = guard.mitigate(&ctx).await.unwrap();
        assert_eq!(report.matched, vec!["promo-banner".to_string()]);
        assert!(report.is_resolved());
    }
}
