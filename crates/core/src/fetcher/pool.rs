//! Process-wide download limiter.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

use crate::metrics;

/// Counting semaphore shared by every batch in the process.
///
/// Cloning is cheap and every clone draws from the same slots.
#[derive(Debug, Clone)]
pub struct DownloadPool {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    in_flight: Arc<AtomicUsize>,
}

/// A held download slot. Released on drop.
#[derive(Debug)]
pub struct PoolSlot {
    _permit: OwnedSemaphorePermit,
    in_flight: Arc<AtomicUsize>,
}

impl Drop for PoolSlot {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        metrics::DOWNLOADS_IN_FLIGHT.dec();
    }
}

impl DownloadPool {
    /// Creates a pool with `capacity` slots (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Waits for a free slot. Fails only after `close`.
    pub async fn acquire(&self) -> Result<PoolSlot, AcquireError> {
        let permit = self.semaphore.clone().acquire_owned().await?;
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        metrics::DOWNLOADS_IN_FLIGHT.inc();
        Ok(PoolSlot {
            _permit: permit,
            in_flight: self.in_flight.clone(),
        })
    }

    /// Stops handing out slots; waiters and later callers get an error.
    pub fn close(&self) {
        self.semaphore.close();
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently held.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}
