// Throttling and retry timing
// The inter-item wait keeps request volume low enough to avoid remote rate
// limiting; it stays in place no matter how the rest of the run is driven.

use async_trait::async_trait;
use std::time::Duration;

/// Something that can wait. Production code sleeps on the tokio timer,
/// tests record the requested waits instead.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, duration: Duration);
}

/// Sleeps for real
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

/// Fixed delays used by the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingPolicy {
    /// Wait after each placed item
    pub item_delay: Duration,
    /// Attempts per title lookup (at least one is always made)
    pub max_attempts: u32,
    /// Wait between failed attempts, no growth
    pub retry_delay: Duration,
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self {
            item_delay: Duration::from_secs(10),
            max_attempts: 3,
            retry_delay: Duration::from_secs(5),
        }
    }
}

impl PacingPolicy {
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}
