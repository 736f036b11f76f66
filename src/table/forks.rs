use std::sync::atomic::{AtomicBool, Ordering};

use super::errors::TableError;

// ============================================================================
// Fork Pool
// ============================================================================
//
// N exclusive forks, each one an independent try-lock. A fork is either
// free or held; who holds it is not recorded.
//
// Acquisition never blocks and never spins: a single compare-exchange
// either takes the fork or reports it busy.
//
// ============================================================================

/// A set of exclusive resources that can be taken without waiting
pub trait ResourcePool: Send + Sync {
    /// Number of forks in the pool
    fn fork_count(&self) -> usize;

    /// Take `fork` if it is free. Returns false if someone else holds it.
    ///
    /// Panics if `fork` is out of range.
    fn try_acquire(&self, fork: usize) -> bool;

    /// Put `fork` back. The caller must be the one holding it; releasing a
    /// free fork is reported as `ForkNotHeld`.
    ///
    /// Panics if `fork` is out of range.
    fn release(&self, fork: usize) -> Result<(), TableError>;

    /// Whether `fork` is currently held by anyone
    fn is_held(&self, fork: usize) -> bool;
}

#[derive(Debug)]
pub struct ForkPool {
    forks: Box<[AtomicBool]>,
}

impl ForkPool {
    pub fn new(size: usize) -> Self {
        Self {
            forks: (0..size).map(|_| AtomicBool::new(false)).collect(),
        }
    }

    /// Number of forks currently held
    pub fn held_count(&self) -> usize {
        self.forks
            .iter()
            .filter(|fork| fork.load(Ordering::Acquire))
            .count()
    }
}

impl ResourcePool for ForkPool {
    fn fork_count(&self) -> usize {
        self.forks.len()
    }

    fn try_acquire(&self, fork: usize) -> bool {
        self.forks[fork]
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    fn release(&self, fork: usize) -> Result<(), TableError> {
        if self.forks[fork].swap(false, Ordering::Release) {
            Ok(())
        } else {
            tracing::error!(fork = fork, "Released a fork nobody was holding");
            Err(TableError::ForkNotHeld { fork })
        }
    }

    fn is_held(&self, fork: usize) -> bool {
        self.forks[fork].load(Ordering::Acquire)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
