//! Periodic driver for [`WeightAdjuster`].

use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

use crate::{CycleOutcome, WeightAdjuster};

/// Shortest period the driver accepts; shorter requests are raised to it.
pub const MIN_PERIOD: Duration = Duration::from_millis(10);

/// Spawns the background task that runs adjustment cycles on a timer.
#[derive(Debug, Clone, Copy)]
pub struct AdjustmentScheduler;

impl AdjustmentScheduler {
    /// Run a cycle every `period` until `token` is cancelled.
    ///
    /// The first tick fires immediately. After each cycle the store's
    /// retention cleanup runs. Neither a skipped cycle nor a failed cleanup
    /// stops the loop.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use std::sync::Arc;
    /// # use std::time::Duration;
    /// # use carpool_tuner::{AdjustmentScheduler, WeightAdjuster};
    /// # use tokio_util::sync::CancellationToken;
    /// # async fn demo(adjuster: Arc<WeightAdjuster>) {
    /// let token = CancellationToken::new();
    /// let handle = AdjustmentScheduler::spawn(adjuster, Duration::from_secs(3600), token.clone());
    /// token.cancel();
    /// let _ = handle.await;
    /// # }
    /// ```
    #[must_use]
    pub fn spawn(
        adjuster: Arc<WeightAdjuster>,
        period: Duration,
        token: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(period.max(MIN_PERIOD));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    _ = ticker.tick() => tick(&adjuster).await,
                }
            }
            info!("weight adjustment scheduler stopped");
        })
    }
}

async fn tick(adjuster: &WeightAdjuster) {
    if let CycleOutcome::Applied(result) = adjuster.run_cycle().await {
        info!(
            "scheduled adjustment applied at {} from {} trips",
            result.timestamp, result.routes_analyzed
        );
    }
    match adjuster.store().cleanup_old_data() {
        Ok(0) => {}
        Ok(deleted) => info!("retention cleanup removed {deleted} trip records"),
        Err(err) => warn!("retention cleanup failed: {err}"),
    }
}
