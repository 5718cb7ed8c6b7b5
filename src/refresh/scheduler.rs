//! Background refresh loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::refresh::refresher::RouteRefresher;

/// Runs refresh cycles on a fixed interval and on manual triggers.
pub struct RefreshScheduler {
    refresher: Arc<RouteRefresher>,
    interval: Duration,
}

impl RefreshScheduler {
    pub fn new(refresher: Arc<RouteRefresher>, interval: Duration) -> Self {
        Self { refresher, interval }
    }

    /// Loop until shutdown. The first scheduled cycle runs one interval from
    /// now; startup is expected to have run the initial cycle itself.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(interval = ?self.interval, "Route refresh scheduler starting");

        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = self.refresher.triggered() => {
                    // Already served by a cycle that started after the trigger.
                    if !self.refresher.is_pending() {
                        continue;
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Refresh scheduler received shutdown signal, exiting loop");
                    break;
                }
            }

            // Outside select!: a cycle that has started is never cancelled.
            if let Err(e) = self.refresher.refresh().await {
                tracing::warn!(error = %e, "Refresh cycle left the route table empty");
            }
        }
    }
}
