use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::errors::TableError;
use super::forks::ResourcePool;
use super::Table;
use crate::config::DurationRange;

// ============================================================================
// Philosopher
// ============================================================================
//
// Cycle:
//   THINKING -> try left -> try right -> EATING -> put both down -> record
//
// A busy fork sends the philosopher straight back to THINKING. If the right
// fork is busy the left one is put down first, so nobody ever waits while
// holding a fork. That is what keeps the table free of deadlock.
//
// Each philosopher reaches for (id, id+1) but flips a coin at seating time
// to decide which of the two is "left". The coin comes from a per-seat
// seeded RNG, so a seed reproduces the whole seating.
//
// Stopping (cancellation or round bound) is only honoured while THINKING.
//
// ============================================================================

/// Outcome of one contention attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    /// Got both forks and ate; meals recorded since the last reset
    Ate { meals_since_reset: u64 },
    /// First fork was taken, nothing held
    LeftBusy,
    /// Second fork was taken, first fork put back
    RightBusy,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhilosopherStats {
    pub id: usize,
    pub left: usize,
    pub right: usize,
    pub rounds: u64,
    pub meals: u64,
    pub left_busy: u64,
    pub right_busy: u64,
}

pub struct Philosopher {
    id: usize,
    left: usize,
    right: usize,
    think: DurationRange,
    eat: DurationRange,
    rng: ChaCha8Rng,
    stats: PhilosopherStats,
}

impl Philosopher {
    pub fn new(
        id: usize,
        seats: usize,
        seed: u64,
        think: DurationRange,
        eat: DurationRange,
    ) -> Result<Self, TableError> {
        if seats < 2 {
            return Err(TableError::TableTooSmall { seats });
        }
        if id >= seats {
            return Err(TableError::UnknownPhilosopher { id, seats });
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let (mut left, mut right) = (id, (id + 1) % seats);
        if rng.random_bool(0.5) {
            std::mem::swap(&mut left, &mut right);
        }

        Ok(Self {
            id,
            left,
            right,
            think,
            eat,
            rng,
            stats: PhilosopherStats {
                id,
                left,
                right,
                ..PhilosopherStats::default()
            },
        })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Fork taken first
    pub fn left(&self) -> usize {
        self.left
    }

    /// Fork taken second
    pub fn right(&self) -> usize {
        self.right
    }

    pub fn stats(&self) -> &PhilosopherStats {
        &self.stats
    }

    /// Think for a random while. Returns false if `stop` fired first.
    pub async fn think(&mut self, stop: &CancellationToken) -> bool {
        let pause = self.think.sample(&mut self.rng);
        tracing::debug!(
            philosopher = self.id,
            duration_ms = pause.as_millis() as u64,
            "Thinking"
        );

        tokio::select! {
            biased;
            _ = stop.cancelled() => false,
            _ = tokio::time::sleep(pause) => true,
        }
    }

    /// Try to take both forks, eat, put them down and record the meal
    pub async fn attempt<P>(&mut self, table: &Table<P>) -> Result<Attempt, TableError>
    where
        P: ResourcePool + ?Sized,
    {
        if !table.forks.try_acquire(self.left) {
            self.stats.left_busy += 1;
            table.metrics.record_backoff(self.id, "left");
            tracing::debug!(
                philosopher = self.id,
                fork = self.left,
                "Left fork busy, back to thinking"
            );
            return Ok(Attempt::LeftBusy);
        }
        table.metrics.fork_picked_up();
        tracing::debug!(philosopher = self.id, fork = self.left, "Picked up left fork");

        if !table.forks.try_acquire(self.right) {
            table.forks.release(self.left)?;
            table.metrics.fork_put_down();
            self.stats.right_busy += 1;
            table.metrics.record_backoff(self.id, "right");
            tracing::debug!(
                philosopher = self.id,
                fork = self.right,
                left = self.left,
                "Right fork busy, put left fork down"
            );
            return Ok(Attempt::RightBusy);
        }

        table.metrics.fork_picked_up();

        let meal = self.eat.sample(&mut self.rng);
        tracing::info!(
            philosopher = self.id,
            left = self.left,
            right = self.right,
            duration_ms = meal.as_millis() as u64,
            "🍝 Picked up both forks, eating"
        );

        table.metrics.eating_started();
        let started = Instant::now();
        tokio::time::sleep(meal).await;
        table.metrics.eating_finished(self.id, started.elapsed().as_secs_f64());

        // Put both down even if the first release trips the contract check
        let right = table.forks.release(self.right);
        let left = table.forks.release(self.left);
        for released in [&right, &left] {
            if released.is_ok() {
                table.metrics.fork_put_down();
            }
        }
        right?;
        left?;

        let meals_since_reset = table.progress.record(self.id).await?;
        self.stats.meals += 1;
        tracing::debug!(
            philosopher = self.id,
            meals = meals_since_reset,
            "Finished eating, forks down"
        );

        Ok(Attempt::Ate { meals_since_reset })
    }

    /// Run the think/attempt cycle until `stop` fires or `rounds` is reached
    pub async fn dine<P>(
        mut self,
        table: Table<P>,
        stop: CancellationToken,
        rounds: Option<u64>,
    ) -> Result<PhilosopherStats, TableError>
    where
        P: ResourcePool + ?Sized,
    {
        tracing::debug!(
            philosopher = self.id,
            left = self.left,
            right = self.right,
            "Seated at the table"
        );

        loop {
            if rounds.is_some_and(|limit| self.stats.rounds >= limit) {
                break;
            }
            if !self.think(&stop).await {
                break;
            }

            self.attempt(&table).await?;
            self.stats.rounds += 1;
        }

        tracing::debug!(
            philosopher = self.id,
            rounds = self.stats.rounds,
            meals = self.stats.meals,
            "Left the table"
        );
        Ok(self.stats)
    }
}

/// Seat `seats` philosophers, deriving each one's RNG seed from `seed`
pub fn seat_philosophers(
    seats: usize,
    seed: u64,
    think: DurationRange,
    eat: DurationRange,
) -> Result<Vec<Philosopher>, TableError> {
    let mut seeder = ChaCha8Rng::seed_from_u64(seed);

    (0..seats)
        .map(|id| Philosopher::new(id, seats, seeder.random(), think, eat))
        .collect()
}

// ============================================================================
// Unit Tests
// ============================================================================
