//! Polling wait loop with a hard upper bound

use tokio::time::{sleep, Instant};
use tracing::{debug, trace};

use holdfast_core_types::SessionContext;

use crate::conditions::{Condition, ConditionHit};
use crate::spec::{TimeoutFailure, WaitSpec};

/// Block (cooperatively) until the condition holds or the budget is spent.
///
/// Each failed probe sleeps the poll interval before retrying; the loop
/// never spins tightly. A `SessionError` during a probe counts as a miss —
/// transient transport noise must not abort a wait. The caller is never
/// blocked longer than `timeout + poll`.
pub async fn wait_for(
    ctx: &SessionContext,
    condition: &dyn Condition,
    spec: WaitSpec,
) -> Result<ConditionHit, TimeoutFailure> {
    let started = Instant::now();
    loop {
        match condition.poll(ctx).await {
            Ok(Some(hit)) => {
                trace!(condition = %hit.label, waited = ?started.elapsed(), "condition held");
                return Ok(hit);
            }
            Ok(None) => {}
            Err(err) => {
                debug!(condition = %condition.label(), error = %err, "probe errored, treating as miss");
            }
        }

        if started.elapsed() >= spec.timeout {
            return Err(TimeoutFailure {
                label: condition.label(),
                waited: started.elapsed(),
            });
        }
        sleep(spec.poll).await;
    }
}

/// Convenience wrapper using the context's default budget.
pub async fn wait_for_default(
    ctx: &SessionContext,
    condition: &dyn Condition,
) -> Result<ConditionHit, TimeoutFailure> {
    wait_for(ctx, condition, WaitSpec::from_context(ctx)).await
}
