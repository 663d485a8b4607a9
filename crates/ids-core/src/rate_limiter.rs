//! Fixed-window rate limiter (C4) — keyed by (principal, channel), used only
//! by the `secure_rate_limit` rule in §4.3. Mirrors the session-registry
//! shape the gateway uses for its own in-memory state: an `Arc<RwLock<HashMap>>`
//! guarded map with a periodic sweep task rather than per-entry expiry timers.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Copy)]
struct Bucket {
    count: u32,
    reset_at: Instant,
}

#[derive(Clone)]
pub struct RateLimiter {
    buckets: Arc<RwLock<HashMap<(Uuid, Uuid), Bucket>>>,
    window: Duration,
    cap: u32,
}

impl RateLimiter {
    pub fn new(window_secs: u64, cap: u32) -> Self {
        Self {
            buckets: Arc::new(RwLock::new(HashMap::new())),
            window: Duration::from_secs(window_secs),
            cap,
        }
    }

    /// Increments the (principal, channel) bucket and reports whether the
    /// caller is now over the cap. Resets the window when it has elapsed.
    pub async fn check(&self, principal: Uuid, channel: Uuid) -> bool {
        let now = Instant::now();
        let mut buckets = self.buckets.write().await;
        let bucket = buckets
            .entry((principal, channel))
            .or_insert(Bucket { count: 0, reset_at: now + self.window });

        if now >= bucket.reset_at {
            bucket.count = 0;
            bucket.reset_at = now + self.window;
        }
        bucket.count += 1;
        bucket.count > self.cap
    }

    /// Discards buckets whose window has closed, bounding memory use.
    pub async fn sweep(&self) {
        let now = Instant::now();
        self.buckets.write().await.retain(|_, bucket| bucket.reset_at > now);
    }
}

/// Spawns the periodic sweep task. The window is the natural sweep interval:
/// nothing useful to reclaim inside a still-open window.
pub fn spawn_sweeper(limiter: RateLimiter, interval_secs: u64) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        loop {
            ticker.tick().await;
            limiter.sweep().await;
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn allows_up_to_cap_then_denies() {
        let limiter = RateLimiter::new(60, 10);
        let principal = Uuid::new_v4();
        let channel = Uuid::new_v4();
        for _ in 0..10 {
            assert!(!limiter.check(principal, channel).await);
        }
        assert!(limiter.check(principal, channel).await);
    }

    #[tokio::test]
    async fn buckets_are_independent_per_channel() {
        let limiter = RateLimiter::new(60, 1);
        let principal = Uuid::new_v4();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert!(!limiter.check(principal, a).await);
        assert!(!limiter.check(principal, b).await);
    }
}
