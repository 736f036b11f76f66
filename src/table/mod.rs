// ============================================================================
// Table - Forks, Philosophers and Progress
// ============================================================================
//
// This module contains the contention core:
// - Forks (ResourcePool trait, ForkPool with atomic try-locks)
// - Philosophers (seating, think/attempt/eat cycle)
// - Progress (meal counters behind one guard, all-nonzero reset)
// - Errors (TableError enum)
//
// Philosophers never talk to each other. Everything they share goes
// through the pool and the tracker bundled in a `Table`.
//
// ============================================================================

pub mod errors;
pub mod forks;
pub mod philosopher;
pub mod progress;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use crate::metrics::Metrics;

pub use errors::*;
pub use forks::*;
pub use philosopher::*;
pub use progress::*;

/// Shared state handed to every philosopher task
pub struct Table<P: ?Sized = ForkPool> {
    pub forks: Arc<P>,
    pub progress: Arc<ProgressTracker>,
    pub metrics: Arc<Metrics>,
}

impl<P: ?Sized> Table<P> {
    pub fn new(forks: Arc<P>, progress: Arc<ProgressTracker>, metrics: Arc<Metrics>) -> Self {
        Self {
            forks,
            progress,
            metrics,
        }
    }
}

impl<P: ?Sized> Clone for Table<P> {
    fn clone(&self) -> Self {
        Self {
            forks: self.forks.clone(),
            progress: self.progress.clone(),
            metrics: self.metrics.clone(),
        }
    }
}
