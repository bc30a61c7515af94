//! Resolve → wait → act → verify pipeline with bounded retries

use tokio::time::sleep;
use tracing::{debug, info, warn};

use holdfast_core_types::{ElementHandle, Key, SessionContext, SessionError};
use holdfast_locator::{resolve, Resolution};
use holdfast_wait::{wait_for, Clickable, Condition, Visible};

use crate::errors::ActionError;
use crate::model::{ActionAttempt, ActionKind, ActionReport, ActionRequest, Tier};
use crate::policy::ActionPolicy;

/// Perform an action with no caller-supplied post-condition.
pub async fn perform(
    ctx: &SessionContext,
    request: &ActionRequest,
    policy: &ActionPolicy,
) -> Result<ActionReport, ActionError> {
    perform_with(ctx, request, policy, None).await
}

/// Perform an action, verifying a caller-supplied post-condition for
/// click-class actions.
///
/// Each round runs the full sequence: resolve the element, wait for the
/// appropriate readiness predicate, walk the strategy tiers, verify the
/// post-condition. Rounds repeat up to the policy's maximum with a pause
/// in between; individual tier failures are swallowed and only the final
/// round's failure is surfaced.
pub async fn perform_with(
    ctx: &SessionContext,
    request: &ActionRequest,
    policy: &ActionPolicy,
    post: Option<&dyn Condition>,
) -> Result<ActionReport, ActionError> {
    let label = request.target.label.clone();
    info!(
        action = request.kind.name(),
        element = %label,
        value = request.loggable_value(),
        "performing action"
    );

    let mut attempts: Vec<ActionAttempt> = Vec::new();
    let mut saw_element = false;

    for round in 1..=policy.max_attempts.max(1) {
        let handle = match resolve(ctx, &request.target).await {
            Resolution::Found(resolved) => resolved.handle,
            Resolution::NotFound => {
                debug!(element = %label, round, "element absent this round");
                if round < policy.max_attempts {
                    sleep(policy.retry_pause).await;
                }
                continue;
            }
        };
        saw_element = true;

        let handle = await_readiness(ctx, request, policy, handle).await;

        let round_ok = run_tiers(ctx, request, policy, post, &handle, round, &mut attempts).await;
        if round_ok {
            info!(action = request.kind.name(), element = %label, round, "action verified");
            return Ok(ActionReport {
                kind: request.kind,
                label,
                attempts,
                verified: request.kind.takes_value() || post.is_some(),
            });
        }

        if round < policy.max_attempts {
            sleep(policy.retry_pause).await;
        }
    }

    if !saw_element {
        return Err(ActionError::ElementNotFound { label });
    }
    Err(ActionError::verification(label, attempts))
}

/// Wait for the readiness predicate matching the action kind: clickable
/// for click-class actions, visible for value-bearing ones. On timeout the
/// tiers still run — a momentarily non-interactive element is exactly what
/// the scripted tier exists for.
async fn await_readiness(
    ctx: &SessionContext,
    request: &ActionRequest,
    policy: &ActionPolicy,
    fallback: ElementHandle,
) -> ElementHandle {
    let hit = match request.kind {
        ActionKind::Click | ActionKind::Submit => {
            let cond = Clickable::new(request.target.clone());
            wait_for(ctx, &cond, policy.readiness).await
        }
        ActionKind::Type | ActionKind::Select => {
            let cond = Visible::new(request.target.clone());
            wait_for(ctx, &cond, policy.readiness).await
        }
    };

    match hit {
        Ok(hit) => hit.element.unwrap_or(fallback),
        Err(timeout) => {
            warn!(element = %request.target.label, %timeout, "readiness wait expired, proceeding anyway");
            fallback
        }
    }
}

/// Walk the strategy tiers for one round. Returns true when an interaction
/// landed and the post-condition held.
async fn run_tiers(
    ctx: &SessionContext,
    request: &ActionRequest,
    policy: &ActionPolicy,
    post: Option<&dyn Condition>,
    handle: &ElementHandle,
    round: u32,
    attempts: &mut Vec<ActionAttempt>,
) -> bool {
    for tier in tiers_for(request.kind) {
        match interact(ctx, request, handle, tier).await {
            Ok(()) => {
                let verified = verify(ctx, request, policy, post, handle).await;
                attempts.push(ActionAttempt {
                    tier,
                    round,
                    ok: verified,
                    reason: (!verified).then(|| "post-condition did not hold".to_string()),
                });
                if verified {
                    return true;
                }
                debug!(
                    element = %request.target.label,
                    tier = tier.name(),
                    round,
                    "interaction landed but verification failed"
                );
            }
            Err(err) => {
                debug!(
                    element = %request.target.label,
                    tier = tier.name(),
                    round,
                    error = %err,
                    "tier failed, falling through"
                );
                attempts.push(ActionAttempt {
                    tier,
                    round,
                    ok: false,
                    reason: Some(err.to_string()),
                });
            }
        }
    }
    false
}

fn tiers_for(kind: ActionKind) -> Vec<Tier> {
    if kind.allows_keyboard_fallback() {
        vec![Tier::Native, Tier::Scripted, Tier::Keyboard]
    } else {
        vec![Tier::Native, Tier::Scripted]
    }
}

async fn interact(
    ctx: &SessionContext,
    request: &ActionRequest,
    handle: &ElementHandle,
    tier: Tier,
) -> Result<(), SessionError> {
    let value = request.value.as_deref().unwrap_or("");
    match (request.kind, tier) {
        (ActionKind::Click | ActionKind::Submit, Tier::Native) => ctx.port.click(handle).await,
        (ActionKind::Click | ActionKind::Submit, Tier::Scripted) => {
            ctx.port.click_js(handle).await
        }
        (ActionKind::Submit, Tier::Keyboard) => {
            ctx.port.focus(handle).await?;
            ctx.port.press_key(Key::Enter).await
        }
        (ActionKind::Type, Tier::Native) => {
            ctx.port.clear(handle).await?;
            ctx.port.type_text(handle, value).await
        }
        (ActionKind::Type, Tier::Scripted) => ctx.port.set_value_js(handle, value).await,
        (ActionKind::Select, Tier::Native) => ctx.port.select_value(handle, value).await,
        (ActionKind::Select, Tier::Scripted) => ctx.port.set_value_js(handle, value).await,
        (kind, tier) => Err(SessionError::InteractionFailed {
            reason: format!("tier {} not applicable to {}", tier.name(), kind.name()),
        }),
    }
}

/// Post-condition check. Typed values must read back equal to the input;
/// masked (password-class) fields only need to be non-empty — their value
/// is never compared or logged. Clicks verify a caller-supplied condition
/// when present, otherwise "no exception" is enough.
async fn verify(
    ctx: &SessionContext,
    request: &ActionRequest,
    policy: &ActionPolicy,
    post: Option<&dyn Condition>,
    handle: &ElementHandle,
) -> bool {
    match request.kind {
        ActionKind::Type | ActionKind::Select => {
            let read_back = match ctx.port.value(handle).await {
                Ok(value) => value,
                Err(err) => {
                    debug!(element = %request.target.label, error = %err, "value read-back failed");
                    return false;
                }
            };
            if request.masked {
                !read_back.is_empty()
            } else {
                read_back == request.value.as_deref().unwrap_or("")
            }
        }
        ActionKind::Click | ActionKind::Submit => match post {
            Some(condition) => wait_for(ctx, condition, policy.post_condition).await.is_ok(),
            None => true,
        },
    }
}
