use tokio::sync::Mutex;

use super::errors::TableError;

// ============================================================================
// Progress Tracker
// ============================================================================
//
// One meal counter per philosopher, all behind a single guard. Every read,
// increment and reset takes that guard, so the observer's
// "everyone has eaten -> zero everything" check cannot interleave with a
// philosopher recording a meal.
//
// ============================================================================

#[derive(Debug)]
pub struct ProgressTracker {
    seats: usize,
    meals: Mutex<Vec<u64>>,
}

impl ProgressTracker {
    pub fn new(seats: usize) -> Self {
        Self {
            seats,
            meals: Mutex::new(vec![0; seats]),
        }
    }

    pub fn seats(&self) -> usize {
        self.seats
    }

    /// Count a finished meal for `id`, returning its meals since the last reset
    pub async fn record(&self, id: usize) -> Result<u64, TableError> {
        let mut meals = self.meals.lock().await;

        let count = meals.get_mut(id).ok_or(TableError::UnknownPhilosopher {
            id,
            seats: self.seats,
        })?;
        *count += 1;

        Ok(*count)
    }

    /// If every philosopher has eaten since the last reset, zero all counters
    /// and return true. Otherwise leave them untouched and return false.
    pub async fn snapshot_and_maybe_reset(&self) -> bool {
        self.drain_if_all_nonzero().await.is_some()
    }

    /// Same check as `snapshot_and_maybe_reset`, handing back the counts that
    /// were cleared.
    pub async fn drain_if_all_nonzero(&self) -> Option<Vec<u64>> {
        let mut meals = self.meals.lock().await;

        if meals.is_empty() || meals.iter().any(|&count| count == 0) {
            return None;
        }

        let drained = meals.clone();
        meals.fill(0);
        Some(drained)
    }

    /// Current counters
    pub async fn snapshot(&self) -> Vec<u64> {
        self.meals.lock().await.clone()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
