use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use super::errors::TableError;
use super::forks::{ForkPool, ResourcePool};

// ============================================================================
// Test Pools
// ============================================================================

/// Wraps a `ForkPool`, counting how many holders each fork has at once and
/// letting a test force the next acquire of a fork to fail.
pub(crate) struct InstrumentedPool {
    inner: ForkPool,
    holders: Vec<AtomicUsize>,
    acquisitions: Vec<AtomicU64>,
    overlaps: AtomicUsize,
    forced_failures: Mutex<Vec<usize>>,
}

impl InstrumentedPool {
    pub(crate) fn new(size: usize) -> Self {
        Self {
            inner: ForkPool::new(size),
            holders: (0..size).map(|_| AtomicUsize::new(0)).collect(),
            acquisitions: (0..size).map(|_| AtomicU64::new(0)).collect(),
            overlaps: AtomicUsize::new(0),
            forced_failures: Mutex::new(Vec::new()),
        }
    }

    /// Make the next `try_acquire(fork)` report the fork as busy
    pub(crate) fn fail_next_acquire(&self, fork: usize) {
        self.forced_failures.lock().unwrap().push(fork);
    }

    /// Times a fork was acquired while someone else already held it
    pub(crate) fn overlaps(&self) -> usize {
        self.overlaps.load(Ordering::SeqCst)
    }

    pub(crate) fn acquisitions(&self, fork: usize) -> u64 {
        self.acquisitions[fork].load(Ordering::SeqCst)
    }

    pub(crate) fn held_count(&self) -> usize {
        self.inner.held_count()
    }
}

impl ResourcePool for InstrumentedPool {
    fn fork_count(&self) -> usize {
        self.inner.fork_count()
    }

    fn try_acquire(&self, fork: usize) -> bool {
        {
            let mut forced = self.forced_failures.lock().unwrap();
            if let Some(pos) = forced.iter().position(|&f| f == fork) {
                forced.remove(pos);
                return false;
            }
        }

        if !self.inner.try_acquire(fork) {
            return false;
        }

        if self.holders[fork].fetch_add(1, Ordering::SeqCst) != 0 {
            self.overlaps.fetch_add(1, Ordering::SeqCst);
        }
        self.acquisitions[fork].fetch_add(1, Ordering::SeqCst);
        true
    }

    fn release(&self, fork: usize) -> Result<(), TableError> {
        if self.inner.is_held(fork) {
            self.holders[fork].fetch_sub(1, Ordering::SeqCst);
        }
        self.inner.release(fork)
    }

    fn is_held(&self, fork: usize) -> bool {
        self.inner.is_held(fork)
    }
}

/// Hands out every fork and then refuses every release
pub(crate) struct BrokenReleasePool {
    size: usize,
}

impl BrokenReleasePool {
    pub(crate) fn new(size: usize) -> Self {
        Self { size }
    }
}

impl ResourcePool for BrokenReleasePool {
    fn fork_count(&self) -> usize {
        self.size
    }

    fn try_acquire(&self, _fork: usize) -> bool {
        true
    }

    fn release(&self, fork: usize) -> Result<(), TableError> {
        Err(TableError::ForkNotHeld { fork })
    }

    fn is_held(&self, _fork: usize) -> bool {
        false
    }
}
