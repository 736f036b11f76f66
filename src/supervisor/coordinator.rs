use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use super::observer::Observer;
use super::report::DinnerReport;
use crate::config::{ConfigError, TableConfig};
use crate::metrics::Metrics;
use crate::table::{seat_philosophers, ForkPool, ProgressTracker, ResourcePool, Table, TableError};

// ============================================================================
// Supervisor - Orchestrates a dinner
// ============================================================================
//
// Responsibilities:
// - Builds the fork pool and progress tracker before any task starts
// - Seats the philosophers and spawns one task each, plus the observer
// - Stops everyone on Ctrl-C, on the run deadline, or on the first failure
// - Joins every task before returning, so shared state outlives all of them
//
// Task Hierarchy:
//   Supervisor
//   ├── Philosopher 0..N
//   ├── Observer
//   └── Deadline timer (only with run_for_secs)
//
// ============================================================================

pub struct Supervisor {
    config: TableConfig,
    metrics: Arc<Metrics>,
}

impl Supervisor {
    pub fn new(config: TableConfig, metrics: Arc<Metrics>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, metrics })
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Run a dinner on a fresh fork pool until `stop` fires or the configured
    /// bounds are reached.
    pub async fn run(self, stop: CancellationToken) -> Result<DinnerReport, TableError> {
        let forks = Arc::new(ForkPool::new(self.config.philosophers));
        self.run_with_pool(forks, stop).await
    }

    /// Same as `run`, on a caller-supplied pool
    pub async fn run_with_pool<P>(
        self,
        forks: Arc<P>,
        stop: CancellationToken,
    ) -> Result<DinnerReport, TableError>
    where
        P: ResourcePool + 'static,
    {
        let run_id = Uuid::now_v7();
        let span = tracing::info_span!("dinner", %run_id);
        self.dine(run_id, forks, stop).instrument(span).await
    }

    async fn dine<P>(
        self,
        run_id: Uuid,
        forks: Arc<P>,
        stop: CancellationToken,
    ) -> Result<DinnerReport, TableError>
    where
        P: ResourcePool + 'static,
    {
        let config = self.config;
        let seats = config.philosophers;
        if forks.fork_count() != seats {
            return Err(TableError::TaskFailed(format!(
                "pool has {} forks for {} philosophers",
                forks.fork_count(),
                seats
            )));
        }

        let seed = config.seed.unwrap_or_else(rand::random);
        let started_at = Utc::now();
        let progress = Arc::new(ProgressTracker::new(seats));
        let table = Table::new(forks, progress.clone(), self.metrics.clone());
        let philosophers = seat_philosophers(seats, seed, config.think, config.eat)?;

        // Internal stops must not cancel the caller's token
        let stop = stop.child_token();

        tracing::info!(
            philosophers = seats,
            seed = seed,
            rounds = ?config.rounds,
            run_for_secs = ?config.run_for_secs,
            "🍽️ Dinner is served"
        );

        let deadline = config.run_for().map(|limit| {
            let stop = stop.clone();
            tokio::spawn(
                async move {
                    tokio::select! {
                        _ = tokio::time::sleep(limit) => {
                            tracing::info!("⏰ Dinner time is over");
                            stop.cancel();
                        }
                        _ = stop.cancelled() => {}
                    }
                }
                .in_current_span(),
            )
        });

        let observer = tokio::spawn(
            Observer::new(progress.clone(), self.metrics.clone(), config.observer_interval())
                .watch(stop.clone())
                .in_current_span(),
        );

        let mut diners = JoinSet::new();
        for philosopher in philosophers {
            diners.spawn(
                philosopher
                    .dine(table.clone(), stop.clone(), config.rounds)
                    .in_current_span(),
            );
        }

        let mut stats = Vec::with_capacity(seats);
        let mut failure = None;
        while let Some(joined) = diners.join_next().await {
            match joined {
                Ok(Ok(finished)) => stats.push(finished),
                Ok(Err(e)) => {
                    tracing::error!(error = %e, "Philosopher failed, stopping the dinner");
                    stop.cancel();
                    failure.get_or_insert(e);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Philosopher task died, stopping the dinner");
                    stop.cancel();
                    failure.get_or_insert(TableError::TaskFailed(e.to_string()));
                }
            }
        }

        // Every philosopher is done; release the observer and the timer
        stop.cancel();
        let resets = observer
            .await
            .map_err(|e| TableError::TaskFailed(format!("observer: {}", e)))?;
        if let Some(deadline) = deadline {
            deadline
                .await
                .map_err(|e| TableError::TaskFailed(format!("deadline timer: {}", e)))?;
        }

        if let Some(e) = failure {
            return Err(e);
        }

        stats.sort_by_key(|s| s.id);
        let report = DinnerReport {
            run_id,
            seed,
            started_at,
            finished_at: Utc::now(),
            philosophers: stats,
            resets,
            meals_since_reset: progress.snapshot().await,
        };

        tracing::info!(
            meals = report.total_meals(),
            backoffs = report.total_backoffs(),
            resets = report.resets,
            "🛑 Dinner finished"
        );

        Ok(report)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
