use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::table::PhilosopherStats;

// ============================================================================
// Dinner Report
// ============================================================================

/// What happened during one dinner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DinnerReport {
    pub run_id: Uuid,
    pub seed: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub philosophers: Vec<PhilosopherStats>,
    /// Observer resets of the meal counters
    pub resets: u64,
    /// Counters as they stood when the dinner ended
    pub meals_since_reset: Vec<u64>,
}

impl DinnerReport {
    pub fn total_meals(&self) -> u64 {
        self.philosophers.iter().map(|p| p.meals).sum()
    }

    pub fn total_rounds(&self) -> u64 {
        self.philosophers.iter().map(|p| p.rounds).sum()
    }

    pub fn total_backoffs(&self) -> u64 {
        self.philosophers
            .iter()
            .map(|p| p.left_busy + p.right_busy)
            .sum()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
