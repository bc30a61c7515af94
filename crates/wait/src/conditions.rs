//! Canned readiness conditions and composition

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use holdfast_core_types::{ElementHandle, SessionContext, SessionError};
use holdfast_locator::{resolve, LocatorSet, Resolution};

/// Document readiness probe.
const DOCUMENT_READY_SCRIPT: &str = "document.readyState === 'complete'";

/// Idle-counter probe, tolerant of the library being absent: a page without
/// jQuery reports idle rather than failing the wait.
const NETWORK_IDLE_SCRIPT: &str =
    "typeof jQuery !== 'undefined' ? jQuery.active == 0 : true";

/// A successful condition poll: which condition fired and, when the
/// condition is element-based, the element it fired on.
#[derive(Debug, Clone)]
pub struct ConditionHit {
    pub label: String,
    pub element: Option<ElementHandle>,
}

impl ConditionHit {
    pub fn session(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            element: None,
        }
    }

    pub fn element(label: impl Into<String>, handle: ElementHandle) -> Self {
        Self {
            label: label.into(),
            element: Some(handle),
        }
    }
}

/// One pollable readiness predicate over the session.
#[async_trait]
pub trait Condition: Send + Sync {
    fn label(&self) -> String;

    /// One probe; `Ok(None)` means "not yet".
    async fn poll(&self, ctx: &SessionContext) -> Result<Option<ConditionHit>, SessionError>;
}

/// Element resolves and is displayed.
pub struct Visible {
    pub target: LocatorSet,
}

impl Visible {
    pub fn new(target: LocatorSet) -> Self {
        Self { target }
    }
}

#[async_trait]
impl Condition for Visible {
    fn label(&self) -> String {
        format!("visible({})", self.target.label)
    }

    async fn poll(&self, ctx: &SessionContext) -> Result<Option<ConditionHit>, SessionError> {
        if let Resolution::Found(resolved) = resolve(ctx, &self.target).await {
            if ctx.port.is_displayed(&resolved.handle).await? {
                return Ok(Some(ConditionHit::element(self.label(), resolved.handle)));
            }
        }
        Ok(None)
    }
}

/// Element is visible, enabled, and inside the viewport — safe to click.
pub struct Clickable {
    pub target: LocatorSet,
}

impl Clickable {
    pub fn new(target: LocatorSet) -> Self {
        Self { target }
    }
}

#[async_trait]
impl Condition for Clickable {
    fn label(&self) -> String {
        format!("clickable({})", self.target.label)
    }

    async fn poll(&self, ctx: &SessionContext) -> Result<Option<ConditionHit>, SessionError> {
        if let Resolution::Found(resolved) = resolve(ctx, &self.target).await {
            let handle = &resolved.handle;
            if ctx.port.is_displayed(handle).await?
                && ctx.port.is_enabled(handle).await?
                && ctx.port.is_in_viewport(handle).await?
            {
                return Ok(Some(ConditionHit::element(self.label(), resolved.handle)));
            }
        }
        Ok(None)
    }
}

/// Element is present in the DOM, visible or not.
pub struct Present {
    pub target: LocatorSet,
}

impl Present {
    pub fn new(target: LocatorSet) -> Self {
        Self { target }
    }
}

#[async_trait]
impl Condition for Present {
    fn label(&self) -> String {
        format!("present({})", self.target.label)
    }

    async fn poll(&self, ctx: &SessionContext) -> Result<Option<ConditionHit>, SessionError> {
        match resolve(ctx, &self.target).await {
            Resolution::Found(resolved) => {
                Ok(Some(ConditionHit::element(self.label(), resolved.handle)))
            }
            Resolution::NotFound => Ok(None),
        }
    }
}

/// Element is invisible or absent — loaders and spinners going away.
pub struct Gone {
    pub target: LocatorSet,
}

impl Gone {
    pub fn new(target: LocatorSet) -> Self {
        Self { target }
    }
}

#[async_trait]
impl Condition for Gone {
    fn label(&self) -> String {
        format!("gone({})", self.target.label)
    }

    async fn poll(&self, ctx: &SessionContext) -> Result<Option<ConditionHit>, SessionError> {
        match resolve(ctx, &self.target).await {
            Resolution::NotFound => Ok(Some(ConditionHit::session(self.label()))),
            Resolution::Found(resolved) => {
                if ctx.port.is_displayed(&resolved.handle).await? {
                    Ok(None)
                } else {
                    Ok(Some(ConditionHit::session(self.label())))
                }
            }
        }
    }
}

/// `document.readyState` reports complete.
pub struct DocumentReady;

#[async_trait]
impl Condition for DocumentReady {
    fn label(&self) -> String {
        "document-ready".to_string()
    }

    async fn poll(&self, ctx: &SessionContext) -> Result<Option<ConditionHit>, SessionError> {
        let value = ctx.port.run_script(DOCUMENT_READY_SCRIPT).await?;
        Ok(truthy(&value).then(|| ConditionHit::session(self.label())))
    }
}

/// Injected idle-counter reports no in-flight activity.
pub struct NetworkIdle;

#[async_trait]
impl Condition for NetworkIdle {
    fn label(&self) -> String {
        "network-idle".to_string()
    }

    async fn poll(&self, ctx: &SessionContext) -> Result<Option<ConditionHit>, SessionError> {
        let value = ctx.port.run_script(NETWORK_IDLE_SCRIPT).await?;
        Ok(truthy(&value).then(|| ConditionHit::session(self.label())))
    }
}

/// Caller-supplied script expression evaluated for truthiness.
pub struct ScriptTruthy {
    pub label: String,
    pub script: String,
}

impl ScriptTruthy {
    pub fn new(label: impl Into<String>, script: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            script: script.into(),
        }
    }
}

#[async_trait]
impl Condition for ScriptTruthy {
    fn label(&self) -> String {
        self.label.clone()
    }

    async fn poll(&self, ctx: &SessionContext) -> Result<Option<ConditionHit>, SessionError> {
        let value = ctx.port.run_script(&self.script).await?;
        Ok(truthy(&value).then(|| ConditionHit::session(self.label())))
    }
}

/// Current URL contains a substring — navigation detection.
pub struct UrlContains {
    pub needle: String,
}

impl UrlContains {
    pub fn new(needle: impl Into<String>) -> Self {
        Self {
            needle: needle.into(),
        }
    }
}

#[async_trait]
impl Condition for UrlContains {
    fn label(&self) -> String {
        format!("url-contains({})", self.needle)
    }

    async fn poll(&self, ctx: &SessionContext) -> Result<Option<ConditionHit>, SessionError> {
        let url = ctx.port.current_url().await?;
        Ok(url
            .contains(&self.needle)
            .then(|| ConditionHit::session(self.label())))
    }
}

/// Succeeds as soon as any member condition succeeds.
///
/// Used after form submission where which signal fires first is not
/// guaranteed: "URL changed OR message appeared OR spinner gone". The hit
/// carries the winning member's label. A member erroring during a tick is
/// skipped for that tick, not fatal.
pub struct AnyOf {
    members: Vec<Box<dyn Condition>>,
}

impl AnyOf {
    pub fn new(members: Vec<Box<dyn Condition>>) -> Self {
        Self { members }
    }
}

#[async_trait]
impl Condition for AnyOf {
    fn label(&self) -> String {
        let labels: Vec<String> = self.members.iter().map(|m| m.label()).collect();
        format!("any-of({})", labels.join(" | "))
    }

    async fn poll(&self, ctx: &SessionContext) -> Result<Option<ConditionHit>, SessionError> {
        for member in &self.members {
            match member.poll(ctx).await {
                Ok(Some(hit)) => return Ok(Some(hit)),
                Ok(None) => {}
                Err(err) => {
                    debug!(member = %member.label(), error = %err, "any-of member errored, skipping tick");
                }
            }
        }
        Ok(None)
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Null => false,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use holdfast_core_types::testkit::{FakeElement, FakeSession};
    use holdfast_locator::Locator;
    use std::sync::Arc;

    fn ctx(session: FakeSession) -> SessionContext {
        SessionContext::new(Arc::new(session))
    }

    #[tokio::test]
    async fn test_clickable_rejects_disabled_element() {
        let session = FakeSession::new("https://example.test", "Home");
        session.add_element(FakeElement::new("btn").matching(["#go"]).disabled());
        let ctx = ctx(session);

        let cond = Clickable::new(LocatorSet::single("go button", Locator::css("#go")));
        assert!(cond.poll(&ctx).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clickable_requires_viewport() {
        let session = FakeSession::new("https://example.test", "Home");
        session.add_element(FakeElement::new("btn").matching(["#go"]).off_screen());
        let ctx = ctx(session);

        let cond = Clickable::new(LocatorSet::single("go button", Locator::css("#go")));
        assert!(cond.poll(&ctx).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_gone_holds_for_absent_and_hidden() {
        let session = FakeSession::new("https://example.test", "Home");
        session.add_element(FakeElement::new("spinner").matching([".spinner"]).hidden());
        let ctx = ctx(session);

        let absent = Gone::new(LocatorSet::single("loader", Locator::css(".loader")));
        assert!(absent.poll(&ctx).await.unwrap().is_some());

        let hidden = Gone::new(LocatorSet::single("spinner", Locator::css(".spinner")));
        assert!(hidden.poll(&ctx).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_network_idle_tolerates_missing_library() {
        // FakeSession defaults to idle, modeling the absent-jQuery path.
        let session = FakeSession::new("https://example.test", "Home");
        let ctx = ctx(session);
        assert!(NetworkIdle.poll(&ctx).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_any_of_reports_winning_member() {
        let session = FakeSession::new("https://example.test/secure", "Secure");
        session.add_element(FakeElement::new("flash").matching(["#flash"]));
        let ctx = ctx(session);

        let cond = AnyOf::new(vec![
            Box::new(UrlContains::new("/nowhere")),
            Box::new(Present::new(LocatorSet::single(
                "flash message",
                Locator::css("#flash"),
            ))),
        ]);

        let hit = cond.poll(&ctx).await.unwrap().expect("one member holds");
        assert_eq!(hit.label, "present(flash message)");
    }

    #[tokio::test]
    async fn test_any_of_skips_erroring_member() {
        let session = FakeSession::new("https://example.test/secure", "Secure");
        session.fail_scripts(true);
        let ctx = ctx(session);

        let cond = AnyOf::new(vec![
            Box::new(DocumentReady),
            Box::new(UrlContains::new("/secure")),
        ]);

        assert!(cond.poll(&ctx).await.unwrap().is_some());
    }
}
