//! Request pacing shared by the HTTP clients.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Semaphore, SemaphorePermit};

/// Bounds concurrent requests and enforces a minimum spacing between them.
pub(crate) struct RateLimiter {
    permits: Arc<Semaphore>,
    last_request: AtomicU64,
    min_interval_ms: u64,
    start_time: Instant,
}

impl RateLimiter {
    pub(crate) fn new(requests_per_minute: u32) -> Self {
        let rpm = requests_per_minute.max(1);
        Self {
            permits: Arc::new(Semaphore::new(rpm as usize)),
            last_request: AtomicU64::new(0),
            min_interval_ms: (60_000 / rpm as u64).max(10),
            start_time: Instant::now(),
        }
    }

    /// Wait for a permit and for the minimum interval to elapse.
    ///
    /// The returned permit must be held for the duration of the request.
    pub(crate) async fn acquire(&self) -> Result<SemaphorePermit<'_>, String> {
        let permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| format!("Rate limiter error: {}", e))?;

        let now_ms = self.start_time.elapsed().as_millis() as u64;
        let last_ms = self.last_request.load(Ordering::Relaxed);
        let elapsed = now_ms.saturating_sub(last_ms);
        if last_ms != 0 && elapsed < self.min_interval_ms {
            tokio::time::sleep(Duration::from_millis(self.min_interval_ms - elapsed)).await;
        }
        self.last_request
            .store(self.start_time.elapsed().as_millis() as u64, Ordering::Relaxed);

        Ok(permit)
    }
}
