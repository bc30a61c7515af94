//! Session-scoped facade over the engine crates

use std::sync::Arc;

use tracing::{debug, info, warn};

use holdfast_action::{perform_with, ActionError, ActionPolicy, ActionReport, ActionRequest};
use holdfast_core_types::{SessionContext, SessionPort};
use holdfast_locator::{resolve, LocatorSet, Resolution};
use holdfast_outcome::{verify_success, OutcomeSignal, Verdict};
use holdfast_overlay::{MitigationReport, OverlayCatalogue, OverlayGuard};
use holdfast_wait::{
    wait_for, AnyOf, Condition, ConditionHit, DocumentReady, NetworkIdle, TimeoutFailure, WaitSpec,
};

/// One engine per logical session. Owns the context, the action policy and
/// the overlay guard; everything else is stateless functions underneath.
///
/// Construction is builder-style:
///
/// ```ignore
/// let engine = Engine::new(port)
///     .with_policy(ActionPolicy::default())
///     .with_catalogue(OverlayCatalogue::default());
/// ```
pub struct Engine {
    ctx: SessionContext,
    policy: ActionPolicy,
    guard: OverlayGuard,
}

impl Engine {
    pub fn new(port: Arc<dyn SessionPort>) -> Self {
        Self {
            ctx: SessionContext::new(port),
            policy: ActionPolicy::default(),
            guard: OverlayGuard::new(OverlayCatalogue::default()),
        }
    }

    pub fn with_context(mut self, ctx: SessionContext) -> Self {
        self.ctx = ctx;
        self
    }

    pub fn with_policy(mut self, policy: ActionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_catalogue(mut self, catalogue: OverlayCatalogue) -> Self {
        self.guard = OverlayGuard::new(catalogue);
        self
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    pub fn policy(&self) -> &ActionPolicy {
        &self.policy
    }

    /// Walk a locator cascade once, without waiting.
    pub async fn resolve(&self, target: &LocatorSet) -> Resolution {
        resolve(&self.ctx, target).await
    }

    /// Wait for a condition under the context's default budget.
    pub async fn wait_for(&self, condition: &dyn Condition) -> Result<ConditionHit, TimeoutFailure> {
        wait_for(&self.ctx, condition, WaitSpec::from_context(&self.ctx)).await
    }

    /// Wait for a condition under an explicit budget.
    pub async fn wait_for_spec(
        &self,
        condition: &dyn Condition,
        spec: WaitSpec,
    ) -> Result<ConditionHit, TimeoutFailure> {
        wait_for(&self.ctx, condition, spec).await
    }

    /// Soft page-settle: document ready, then the idle counter. Timeouts
    /// are logged and swallowed; settling is opportunistic and the next
    /// interaction carries its own readiness wait anyway.
    pub async fn settle(&self) {
        let spec = WaitSpec::from_context(&self.ctx);
        if let Err(timeout) = wait_for(&self.ctx, &DocumentReady, spec).await {
            debug!(%timeout, "document never reported ready, continuing");
        }
        if let Err(timeout) = wait_for(&self.ctx, &NetworkIdle, WaitSpec::short()).await {
            debug!(%timeout, "idle counter never settled, continuing");
        }
    }

    /// Perform an action under the engine's policy.
    pub async fn perform(&self, request: &ActionRequest) -> Result<ActionReport, ActionError> {
        perform_with(&self.ctx, request, &self.policy, None).await
    }

    /// Perform an action and verify a post-condition for click-class kinds.
    pub async fn perform_verified(
        &self,
        request: &ActionRequest,
        post: &dyn Condition,
    ) -> Result<ActionReport, ActionError> {
        perform_with(&self.ctx, request, &self.policy, Some(post)).await
    }

    /// One overlay detection and dismissal pass.
    pub async fn mitigate_overlays(&self) -> MitigationReport {
        match self.guard.mitigate(&self.ctx).await {
            Ok(report) => report,
            Err(err) => {
                // Mitigation is best-effort; a broken session surfaces on
                // the next real interaction instead.
                warn!(error = %err, "overlay mitigation pass errored");
                MitigationReport {
                    outcome: holdfast_overlay::MitigationOutcome::Unresolved,
                    matched: Vec::new(),
                    applied: Vec::new(),
                    trace: Vec::new(),
                }
            }
        }
    }

    /// Judge the current page against outcome signals.
    pub async fn verify_success(&self, signals: &[OutcomeSignal]) -> Verdict {
        verify_success(&self.ctx, signals).await
    }

    /// Submission wrapped in overlay hygiene: mitigate, act, give the page
    /// a bounded chance to show any settle signal, mitigate whatever the
    /// navigation spawned. The settle wait is soft; overlays and slow
    /// redirects are exactly when it expires.
    pub async fn submit_guarded(
        &self,
        request: &ActionRequest,
        settle_signals: Vec<Box<dyn Condition>>,
    ) -> Result<ActionReport, ActionError> {
        let before = self.mitigate_overlays().await;
        if !before.matched.is_empty() {
            info!(
                outcome = ?before.outcome,
                signals = ?before.matched,
                "pre-submit overlay pass"
            );
        }

        let report = self.perform(request).await?;

        if !settle_signals.is_empty() {
            let settle = AnyOf::new(settle_signals);
            if let Err(timeout) = wait_for(&self.ctx, &settle, WaitSpec::short()).await {
                debug!(%timeout, "no settle signal after submission");
            }
        }

        let after = self.mitigate_overlays().await;
        if !after.matched.is_empty() {
            info!(
                outcome = ?after.outcome,
                signals = ?after.matched,
                "post-submit overlay pass"
            );
        }

        Ok(report)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("ctx", &self.ctx)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use holdfast_core_types::testkit::{ClickEffect, FakeElement, FakeSession};
    use holdfast_locator::Locator;
    use holdfast_wait::UrlContains;
    use std::sync::Arc;

    fn engine(session: Arc<FakeSession>) -> Engine {
        Engine::new(session).with_policy(ActionPolicy::fast())
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_guarded_clears_overlay_before_acting() {
        let session = Arc::new(FakeSession::new("https://example.test/register", "Register"));
        session.add_element(FakeElement::new("vignette").matching([".modal"]).as_overlay());
        session.dismiss_overlays_after_escapes(1);
        session.add_element(
            FakeElement::new("go")
                .matching(["button[type='submit']"])
                .on_click(ClickEffect::SetUrl("https://example.test/login".into())),
        );
        let engine = engine(session.clone());

        let request = ActionRequest::submit(LocatorSet::single(
            "register button",
            Locator::css("button[type='submit']"),
        ));
        let report = engine
            .submit_guarded(&request, vec![Box::new(UrlContains::new("/login"))])
            .await
            .unwrap();

        assert_eq!(report.attempts.len(), 1);
        assert_eq!(session.matching_count(".modal"), 0);
        assert_eq!(session.url(), "https://example.test/login");
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_is_soft_on_stuck_page() {
        let session = Arc::new(FakeSession::new("https://example.test", "Home"));
        session.set_document_ready(false);
        let engine = engine(session);

        // Must return despite neither condition ever holding.
        engine.settle().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_engine_wait_uses_context_budget() {
        let session: Arc<FakeSession> = Arc::new(FakeSession::new("https://example.test", "Home"));
        let engine = Engine::new(session.clone()).with_context(
            SessionContext::new(session)
                .with_timeout(std::time::Duration::from_millis(100))
                .with_poll(std::time::Duration::from_millis(20)),
        );

        let err = engine
            .wait_for(&UrlContains::new("/never"))
            .await
            .unwrap_err();
        assert!(err.waited <= std::time::Duration::from_millis(200));
    }
}
