use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::metrics::Metrics;
use crate::table::ProgressTracker;

// ============================================================================
// Observer - watches the meal counters
// ============================================================================
//
// Wakes once per interval and asks the tracker whether everyone has eaten
// since the last reset. If so the tracker zeroes the counters and the
// observer announces it. Purely informational: philosophers never wait on it.
//
// ============================================================================

const MIN_INTERVAL: Duration = Duration::from_millis(1);

pub struct Observer {
    progress: Arc<ProgressTracker>,
    metrics: Arc<Metrics>,
    interval: Duration,
}

impl Observer {
    /// Intervals shorter than a millisecond are raised to one
    pub fn new(progress: Arc<ProgressTracker>, metrics: Arc<Metrics>, interval: Duration) -> Self {
        Self {
            progress,
            metrics,
            interval: interval.max(MIN_INTERVAL),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// One observation. Returns true if the counters were reset.
    pub async fn check(&self) -> bool {
        match self.progress.drain_if_all_nonzero().await {
            Some(meals) => {
                self.metrics.record_reset();
                tracing::info!(
                    meals = ?meals,
                    "🔄 All philosophers have eaten at least once, resetting counters"
                );
                true
            }
            None => false,
        }
    }

    /// Observe until `stop` fires, returning how many resets happened
    pub async fn watch(self, stop: CancellationToken) -> u64 {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        let mut resets = 0;
        loop {
            tokio::select! {
                biased;
                _ = stop.cancelled() => break,
                _ = ticker.tick() => {
                    if self.check().await {
                        resets += 1;
                    }
                }
            }
        }

        tracing::debug!(resets = resets, "Observer stopped");
        resets
    }
}
