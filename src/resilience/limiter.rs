use crate::{Error, Result};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Point-in-time view of limiter occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimiterSnapshot {
    pub limit: usize,
    pub running: usize,
    pub available: usize,
    /// Highest `running` value observed since construction.
    pub peak: usize,
}

#[derive(Debug, Default)]
struct Gauge {
    running: AtomicUsize,
    peak: AtomicUsize,
}

/// Admission gate that lets at most `limit` tasks run at once.
///
/// Waiters are queued by the underlying tokio semaphore, which hands out permits
/// strictly in arrival order. Cloning shares the same gate.
#[derive(Debug, Clone)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    limit: usize,
    gauge: Arc<Gauge>,
}

/// A running slot. Dropping it frees the slot and wakes the next waiter.
#[derive(Debug)]
pub struct LimiterPermit {
    gauge: Arc<Gauge>,
    _permit: OwnedSemaphorePermit,
}

impl Drop for LimiterPermit {
    fn drop(&mut self) {
        // Runs before `_permit` is released, so `running` never overshoots the limit.
        self.gauge.running.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ConcurrencyLimiter {
    /// A limit of 0 is treated as 1.
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            limit,
            gauge: Arc::new(Gauge::default()),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Wait for a free slot.
    pub async fn acquire(&self) -> Result<LimiterPermit> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| Error::runtime("concurrency limiter closed"))?;
        let running = self.gauge.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.gauge.peak.fetch_max(running, Ordering::SeqCst);
        Ok(LimiterPermit {
            gauge: self.gauge.clone(),
            _permit: permit,
        })
    }

    /// Run `task` once a slot is free; the slot is released when it finishes,
    /// whatever the outcome.
    pub async fn submit<F, Fut, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let _permit = self.acquire().await?;
        Ok(task().await)
    }

    pub fn snapshot(&self) -> LimiterSnapshot {
        LimiterSnapshot {
            limit: self.limit,
            running: self.gauge.running.load(Ordering::SeqCst),
            available: self.semaphore.available_permits(),
            peak: self.gauge.peak.load(Ordering::SeqCst),
        }
    }
}
