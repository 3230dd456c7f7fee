//! Sleep and cancellation helpers shared by the engine loops.

use std::time::Duration;
use tokio::sync::watch;

/// Time left to wait so that a cycle which already took `elapsed` lasts at
/// least `min_cycle`.
pub fn remaining_cycle(elapsed: Duration, min_cycle: Duration) -> Duration {
    min_cycle.saturating_sub(elapsed)
}

/// Resolves once shutdown is requested, or when the signal sender is gone.
pub async fn shutdown_requested(shutdown_rx: &mut watch::Receiver<bool>) {
    let _ = shutdown_rx.wait_for(|stop| *stop).await;
}

/// Sleep for `duration` unless shutdown comes first.
///
/// Returns `false` when interrupted by shutdown.
pub async fn sleep_or_shutdown(shutdown_rx: &mut watch::Receiver<bool>, duration: Duration) -> bool {
    if duration.is_zero() {
        return !*shutdown_rx.borrow();
    }
    tokio::select! {
        biased;
        _ = shutdown_requested(shutdown_rx) => false,
        _ = tokio::time::sleep(duration) => true,
    }
}
