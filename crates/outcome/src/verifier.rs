//! Disjunctive outcome verification

use regex::Regex;
use tracing::{debug, info, warn};

use holdfast_core_types::SessionContext;
use holdfast_locator::{resolve, Resolution};

use crate::signal::{OutcomeSignal, Verdict};

/// Judge a flow outcome from the given signals.
///
/// Positive signals are checked in order and the first hit wins. Probe
/// errors on individual signals count as a miss, not a failure: the point
/// of listing several signals is that any one of them may be unreadable
/// on a mangled page. The clean-departure fallback is consulted only when
/// every positive signal misses.
pub async fn verify_success(ctx: &SessionContext, signals: &[OutcomeSignal]) -> Verdict {
    for signal in signals.iter().filter(|s| !s.is_fallback()) {
        if check(ctx, signal).await {
            info!(signal = %signal.label(), "outcome verified");
            return Verdict::from_signal(signal);
        }
    }

    for signal in signals.iter().filter(|s| s.is_fallback()) {
        if check(ctx, signal).await {
            info!(signal = %signal.label(), "outcome verified via fallback");
            return Verdict::from_signal(signal);
        }
    }

    warn!(signals = signals.len(), "no outcome signal fired");
    Verdict::failure()
}

async fn check(ctx: &SessionContext, signal: &OutcomeSignal) -> bool {
    match signal {
        OutcomeSignal::UrlContains(needle) => match ctx.port.current_url().await {
            Ok(url) => url.contains(needle.as_str()),
            Err(err) => miss(signal, &err),
        },
        OutcomeSignal::UrlMatches(pattern) => match ctx.port.current_url().await {
            Ok(url) => matches_pattern(signal, pattern, &url),
            Err(err) => miss(signal, &err),
        },
        OutcomeSignal::TitleContains(needle) => match ctx.port.title().await {
            Ok(title) => title.contains(needle.as_str()),
            Err(err) => miss(signal, &err),
        },
        OutcomeSignal::TitleMatches(pattern) => match ctx.port.title().await {
            Ok(title) => matches_pattern(signal, pattern, &title),
            Err(err) => miss(signal, &err),
        },
        OutcomeSignal::MarkerVisible { target, .. } => match resolve(ctx, target).await {
            Resolution::Found(found) => ctx.port.is_displayed(&found.handle).await.unwrap_or(false),
            Resolution::NotFound => false,
        },
        OutcomeSignal::FlashContains { target, needle } => match resolve(ctx, target).await {
            Resolution::Found(found) => match ctx.port.text(&found.handle).await {
                Ok(text) => text.to_lowercase().contains(&needle.to_lowercase()),
                Err(err) => miss(signal, &err),
            },
            Resolution::NotFound => false,
        },
        OutcomeSignal::CleanDeparture {
            origin_fragment,
            error_markers,
        } => {
            let departed = match ctx.port.current_url().await {
                Ok(url) => !url.contains(origin_fragment.as_str()),
                Err(err) => return miss(signal, &err),
            };
            if !departed {
                return false;
            }
            match resolve(ctx, error_markers).await {
                Resolution::Found(found) => {
                    !ctx.port.is_displayed(&found.handle).await.unwrap_or(false)
                }
                Resolution::NotFound => true,
            }
        }
    }
}

fn matches_pattern(signal: &OutcomeSignal, pattern: &str, haystack: &str) -> bool {
    match Regex::new(pattern) {
        Ok(re) => re.is_match(haystack),
        Err(err) => {
            warn!(signal = %signal.label(), error = %err, "invalid outcome pattern");
            false
        }
    }
}

fn miss(signal: &OutcomeSignal, err: &dyn std::fmt::Display) -> bool {
    debug!(signal = %signal.label(), error = %err, "outcome probe failed");
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use holdfast_core_types::testkit::{FakeElement, FakeSession};
    use holdfast_locator::{Locator, LocatorSet};
    use std::sync::Arc;

    fn ctx(session: Arc<FakeSession>) -> SessionContext {
        SessionContext::new(session)
    }

    fn login_signals() -> Vec<OutcomeSignal> {
        vec![
            OutcomeSignal::UrlContains("/secure".into()),
            OutcomeSignal::flash("You logged into a secure area!"),
        ]
    }

    #[tokio::test]
    async fn test_first_positive_signal_short_circuits() {
        let session = Arc::new(FakeSession::new("https://example.test/secure", "Secure"));
        let ctx = ctx(session);

        let verdict = verify_success(&ctx, &login_signals()).await;
        assert!(verdict.ok);
        assert_eq!(verdict.fired, vec!["url-contains:/secure".to_string()]);
    }

    #[tokio::test]
    async fn test_flash_signal_rescues_mangled_url() {
        // Interstitial left the URL unusable; the flash banner still shows.
        let session = Arc::new(FakeSession::new(
            "https://example.test/login#google_vignette",
            "Login",
        ));
        session.add_element(
            FakeElement::new("flash")
                .matching(["#flash"])
                .with_text("You logged into a secure area!"),
        );
        let ctx = ctx(session);

        let verdict = verify_success(&ctx, &login_signals()).await;
        assert!(verdict.ok);
        assert_eq!(
            verdict.fired,
            vec!["flash-contains:You logged into a secure area!".to_string()]
        );
    }

    #[tokio::test]
    async fn test_flash_falls_back_to_alert_role() {
        let session = Arc::new(FakeSession::new("https://example.test/login", "Login"));
        session.add_element(
            FakeElement::new("alert")
                .matching(["div[role='alert']"])
                .with_text("Successfully registered, you can log in now."),
        );
        let ctx = ctx(session);

        let verdict =
            verify_success(&ctx, &[OutcomeSignal::flash("successfully registered")]).await;
        assert!(verdict.ok);
    }

    #[tokio::test]
    async fn test_clean_departure_only_when_positives_miss() {
        let session = Arc::new(FakeSession::new("https://example.test/", "Home"));
        let ctx = ctx(session);

        let signals = vec![
            OutcomeSignal::UrlContains("/secure".into()),
            OutcomeSignal::CleanDeparture {
                origin_fragment: "/register".into(),
                error_markers: crate::signal::error_markers(),
            },
        ];
        let verdict = verify_success(&ctx, &signals).await;
        assert!(verdict.ok);
        assert_eq!(verdict.fired, vec!["clean-departure:/register".to_string()]);
    }

    #[tokio::test]
    async fn test_clean_departure_blocked_by_visible_error() {
        let session = Arc::new(FakeSession::new("https://example.test/", "Home"));
        session.add_element(
            FakeElement::new("err")
                .matching([".alert-danger"])
                .with_text("Invalid username."),
        );
        let ctx = ctx(session);

        let signals = vec![OutcomeSignal::CleanDeparture {
            origin_fragment: "/register".into(),
            error_markers: crate::signal::error_markers(),
        }];
        let verdict = verify_success(&ctx, &signals).await;
        assert!(!verdict.ok);
        assert!(verdict.fired.is_empty());
    }

    #[tokio::test]
    async fn test_clean_departure_requires_leaving_origin() {
        let session = Arc::new(FakeSession::new(
            "https://example.test/register",
            "Register",
        ));
        let ctx = ctx(session);

        let signals = vec![OutcomeSignal::CleanDeparture {
            origin_fragment: "/register".into(),
            error_markers: crate::signal::error_markers(),
        }];
        assert!(!verify_success(&ctx, &signals).await.ok);
    }

    #[tokio::test]
    async fn test_probe_error_counts_as_miss_not_failure() {
        let session = Arc::new(FakeSession::new("https://example.test/secure", "Secure"));
        session.mark_selector_invalid("#flash");
        session.mark_selector_invalid("div[role='alert']");
        let ctx = ctx(session);

        // Flash probe errors, URL still decides.
        let signals = vec![
            OutcomeSignal::flash("logged in"),
            OutcomeSignal::UrlContains("/secure".into()),
        ];
        let verdict = verify_success(&ctx, &signals).await;
        assert!(verdict.ok);
        assert_eq!(verdict.fired, vec!["url-contains:/secure".to_string()]);
    }

    #[tokio::test]
    async fn test_url_and_title_patterns() {
        let session = Arc::new(FakeSession::new(
            "https://example.test/users/42",
            "Profile - 42",
        ));
        let ctx = ctx(session);

        let verdict = verify_success(
            &ctx,
            &[OutcomeSignal::UrlMatches(r"/users/\d+$".into())],
        )
        .await;
        assert!(verdict.ok);

        let verdict =
            verify_success(&ctx, &[OutcomeSignal::TitleMatches(r"^Profile".into())]).await;
        assert!(verdict.ok);
    }

    #[tokio::test]
    async fn test_marker_must_be_visible() {
        let session = Arc::new(FakeSession::new("https://example.test/", "Home"));
        session.add_element(FakeElement::new("badge").matching([".account-badge"]).hidden());
        let ctx = ctx(session);

        let signals = vec![OutcomeSignal::MarkerVisible {
            label: "account badge".into(),
            target: LocatorSet::single("account badge", Locator::css(".account-badge")),
        }];
        assert!(!verify_success(&ctx, &signals).await.ok);
    }

    #[tokio::test]
    async fn test_invalid_pattern_is_a_miss() {
        let session = Arc::new(FakeSession::new("https://example.test/", "Home"));
        let ctx = ctx(session);

        let verdict = verify_success(&ctx, &[OutcomeSignal::UrlMatches("(".into())]).await;
        assert!(!verdict.ok);
    }
}
