use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Spaces outbound requests at least `min_interval` apart.
///
/// Owned by a single gateway instance. Uses tokio's monotonic clock so wall
/// clock jumps cannot open or stall the gate, and so tests can pause time.
#[derive(Debug)]
pub struct Throttle {
    min_interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: Mutex::new(None),
        }
    }

    /// Wait until a request may be sent, then claim the slot.
    pub async fn acquire(&self) {
        if self.min_interval.is_zero() {
            return;
        }
        // Holding the lock across the sleep queues concurrent callers in order.
        let mut last = self.last.lock().await;
        if let Some(prev) = *last {
            let ready = prev + self.min_interval;
            if ready > Instant::now() {
                tracing::trace!(
                    wait_ms = (ready - Instant::now()).as_millis() as u64,
                    "Throttling outbound request"
                );
                tokio::time::sleep_until(ready).await;
            }
        }
        *last = Some(Instant::now());
    }
}
