//! Candidate walk with per-candidate error tolerance

use tracing::{debug, warn};

use holdfast_core_types::{ElementHandle, SessionContext};

use crate::types::{Locator, LocatorSet, Resolution, ResolvedElement};

/// Resolve a logical element through its candidate cascade.
///
/// Candidates are tried in order; the first one yielding at least one match
/// wins, and the first element of that match is selected. A candidate that
/// matches nothing is skipped silently; a candidate whose query errors
/// (invalid selector syntax, transport hiccup) is logged and skipped rather
/// than failing the whole resolution.
pub async fn resolve(ctx: &SessionContext, set: &LocatorSet) -> Resolution {
    for (index, candidate) in set.candidates.iter().enumerate() {
        debug!(element = %set.label, candidate = %candidate, "trying locator candidate");

        let handles = match ctx.port.query(&candidate.query).await {
            Ok(handles) => handles,
            Err(err) => {
                warn!(
                    element = %set.label,
                    candidate = %candidate,
                    error = %err,
                    "locator candidate query failed, skipping"
                );
                continue;
            }
        };

        if let Some(handle) = pick_match(ctx, candidate, handles).await {
            debug!(
                element = %set.label,
                candidate = %candidate,
                handle = %handle.0,
                "locator candidate matched"
            );
            return Resolution::Found(ResolvedElement {
                handle,
                candidate: index,
            });
        }
    }

    debug!(element = %set.label, "locator cascade exhausted");
    Resolution::NotFound
}

/// First element of the match, with the role-text filter applied when the
/// candidate carries one.
async fn pick_match(
    ctx: &SessionContext,
    candidate: &Locator,
    handles: Vec<ElementHandle>,
) -> Option<ElementHandle> {
    let Some(filter) = &candidate.text_filter else {
        return handles.into_iter().next();
    };

    let wanted = normalize(filter);
    for handle in handles {
        match ctx.port.text(&handle).await {
            Ok(text) if normalize(&text).contains(&wanted) => return Some(handle),
            Ok(_) => {}
            Err(err) => {
                debug!(handle = %handle.0, error = %err, "text probe failed during match");
            }
        }
    }
    None
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use holdfast_core_types::testkit::{FakeElement, FakeSession};
    use std::sync::Arc;

    fn ctx(session: FakeSession) -> SessionContext {
        SessionContext::new(Arc::new(session))
    }

    #[tokio::test]
    async fn test_first_matching_candidate_wins() {
        let session = FakeSession::new("https://example.test", "Home");
        session.add_element(
            FakeElement::new("by-id").matching(["#username", "input[name='username']"]),
        );
        session.add_element(FakeElement::new("generic").matching(["input[name='username']"]));
        let ctx = ctx(session);

        let set = LocatorSet::new("username field")
            .with(Locator::css("#username"))
            .with(Locator::attr("name", "username"));

        match resolve(&ctx, &set).await {
            Resolution::Found(resolved) => {
                assert_eq!(resolved.handle.0, "by-id");
                assert_eq!(resolved.candidate, 0);
            }
            Resolution::NotFound => panic!("expected a match"),
        }
    }

    #[tokio::test]
    async fn test_only_later_candidate_matches() {
        let session = FakeSession::new("https://example.test", "Home");
        session.add_element(
            FakeElement::new("real-input")
                .matching(["input[type='text']"])
                .with_attribute("type", "text"),
        );
        let ctx = ctx(session);

        // Three candidates for the username field; only the third exists.
        let set = LocatorSet::new("username field")
            .with(Locator::css("#username"))
            .with(Locator::attr("name", "username"))
            .with(Locator::css("input[type='text']"));

        match resolve(&ctx, &set).await {
            Resolution::Found(resolved) => {
                assert_eq!(resolved.handle.0, "real-input");
                assert_eq!(resolved.candidate, 2);
            }
            Resolution::NotFound => panic!("third candidate should have matched"),
        }
    }

    #[tokio::test]
    async fn test_exhausted_cascade_returns_not_found() {
        let session = FakeSession::new("https://example.test", "Home");
        let ctx = ctx(session);

        let set = LocatorSet::new("ghost element")
            .with(Locator::css("#missing"))
            .with(Locator::css(".also-missing"));

        assert!(!resolve(&ctx, &set).await.is_found());
    }

    #[tokio::test]
    async fn test_invalid_candidate_is_skipped_not_fatal() {
        let session = FakeSession::new("https://example.test", "Home");
        session.add_element(FakeElement::new("ok").matching([".fallback"]));
        session.mark_selector_invalid("input[name=");
        let ctx = ctx(session);

        let set = LocatorSet::new("field")
            .with(Locator::css("input[name="))
            .with(Locator::css(".fallback"));

        match resolve(&ctx, &set).await {
            Resolution::Found(resolved) => assert_eq!(resolved.handle.0, "ok"),
            Resolution::NotFound => panic!("fallback candidate should have matched"),
        }
    }

    #[tokio::test]
    async fn test_role_text_filters_by_visible_text() {
        let session = FakeSession::new("https://example.test", "Home");
        session.add_element(
            FakeElement::new("cancel-btn")
                .matching(["[role='button']"])
                .with_text("Cancel"),
        );
        session.add_element(
            FakeElement::new("submit-btn")
                .matching(["[role='button']"])
                .with_text("  Submit  "),
        );
        let ctx = ctx(session);

        let set = LocatorSet::single("submit button", Locator::role_text("button", "submit"));

        match resolve(&ctx, &set).await {
            Resolution::Found(resolved) => assert_eq!(resolved.handle.0, "submit-btn"),
            Resolution::NotFound => panic!("role-text candidate should have matched"),
        }
    }

    #[tokio::test]
    async fn test_duplicate_candidates_are_harmless() {
        let session = FakeSession::new("https://example.test", "Home");
        session.add_element(FakeElement::new("one").matching(["#field"]));
        let ctx = ctx(session);

        let set = LocatorSet::new("field")
            .with(Locator::css("#field"))
            .with(Locator::css("#field"));

        assert!(resolve(&ctx, &set).await.is_found());
    }
}
