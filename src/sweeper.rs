use std::sync::Weak;
use std::time::Duration;

use crate::intake::IntakeGuard;
use crate::model::local_now;

/// Background task that periodically drops expired intake state. Exits once the
/// guard has been dropped.
pub async fn run_sweeper(guard: Weak<IntakeGuard>, every: Duration) {
    let mut interval = tokio::time::interval(every);
    loop {
        interval.tick().await;
        let Some(guard) = guard.upgrade() else {
            tracing::debug!("intake guard dropped, sweeper exiting");
            return;
        };
        let dropped = guard.sweep(local_now());
        if dropped > 0 {
            tracing::debug!(dropped, "swept expired intake state");
        }
    }
}
