//! Bulkhead admission control.
//!
//! # Responsibilities
//! - Bound concurrent in-flight calls per provider
//! - Queue a bounded number of waiters, admitted FIFO
//! - Reject immediately once the queue is full
//!
//! A cancelled run gives up its queue slot at the next wakeup; it never
//! holds capacity it can no longer use.

use crate::config::BulkheadConfig;
use crate::observability::metrics;
use crate::resilience::ResilienceError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

/// Per-provider admission limiter.
#[derive(Debug)]
pub struct Bulkhead {
    provider: String,
    config: BulkheadConfig,
    slots: Arc<Semaphore>,
    queued: AtomicUsize,
}

/// Decrements the queue counter when a waiter leaves the queue, whether it
/// was admitted or cancelled.
struct QueueSlot<'a>(&'a AtomicUsize);

impl Drop for QueueSlot<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

impl Bulkhead {
    pub fn new(provider: &str, config: BulkheadConfig) -> Self {
        Self {
            provider: provider.to_string(),
            slots: Arc::new(Semaphore::new(config.max_concurrent_calls)),
            queued: AtomicUsize::new(0),
            config,
        }
    }

    /// Calls currently executing.
    pub fn in_flight(&self) -> usize {
        self.config
            .max_concurrent_calls
            .saturating_sub(self.slots.available_permits())
    }

    /// Callers currently waiting for a slot.
    pub fn queued(&self) -> usize {
        self.queued.load(Ordering::Relaxed)
    }

    /// Acquire an execution slot, waiting in the bounded FIFO queue if all
    /// slots are busy. The permit releases the slot on drop.
    pub async fn acquire(
        &self,
        cancel: &CancellationToken,
    ) -> Result<OwnedSemaphorePermit, ResilienceError> {
        if let Ok(permit) = self.slots.clone().try_acquire_owned() {
            return Ok(permit);
        }

        // All slots busy: claim a queue position or reject.
        let mut waiting = self.queued.load(Ordering::Relaxed);
        loop {
            if waiting >= self.config.max_queue_size {
                metrics::record_bulkhead_rejection(&self.provider);
                return Err(ResilienceError::BulkheadCapacity {
                    provider: self.provider.clone(),
                    max_concurrent: self.config.max_concurrent_calls,
                    max_queue: self.config.max_queue_size,
                });
            }
            match self.queued.compare_exchange_weak(
                waiting,
                waiting + 1,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(current) => waiting = current,
            }
        }
        let _slot = QueueSlot(&self.queued);

        // Tokio semaphores wake waiters in FIFO order, which is the
        // admission fairness the engine promises.
        tokio::select! {
            permit = self.slots.clone().acquire_owned() => {
                permit.map_err(|_| ResilienceError::Cancelled)
            }
            _ = cancel.cancelled() => Err(ResilienceError::Cancelled),
        }
    }
}
