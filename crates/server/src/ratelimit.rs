use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use dashmap::DashMap;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::api::ClientIp;
use crate::config::RateLimiterConfig;
use crate::error::ServerError;

/// Remaining tokens for one client in the current interval.
#[derive(Debug, Clone, Copy)]
struct Bucket {
    tokens: u32,
    refill_at: Instant,
}

/// Rejected request: how long until the bucket is full again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitExceeded {
    pub retry_after: Duration,
}

/// Checks between two sweeps of expired buckets.
const SWEEP_EVERY: u64 = 256;

/// In-memory per-client token bucket.
///
/// Each client starts with `tokens_per_interval` tokens. The bucket is
/// refilled in full once `interval_ms` has passed since it was opened.
/// Expired buckets are dropped every [`SWEEP_EVERY`] checks, so the map
/// only holds clients seen within the last interval.
#[derive(Debug)]
pub struct RateLimiter {
    capacity: u32,
    interval: Duration,
    buckets: DashMap<String, Bucket>,
    checks: AtomicU64,
}

impl RateLimiter {
    pub fn new(config: &RateLimiterConfig) -> Self {
        Self {
            capacity: config.tokens_per_interval,
            interval: Duration::from_millis(config.interval_ms),
            buckets: DashMap::new(),
            checks: AtomicU64::new(0),
        }
    }

    /// Take one token for `key`.
    pub fn check(&self, key: &str) -> Result<(), RateLimitExceeded> {
        let now = Instant::now();
        if (self.checks.fetch_add(1, Ordering::Relaxed) + 1).is_multiple_of(SWEEP_EVERY) {
            self.evict_expired_at(now);
        }

        let mut bucket = self.buckets.entry(key.to_owned()).or_insert_with(|| Bucket {
            tokens: self.capacity,
            refill_at: now + self.interval,
        });

        if now >= bucket.refill_at {
            *bucket = Bucket {
                tokens: self.capacity,
                refill_at: now + self.interval,
            };
        }

        if bucket.tokens == 0 {
            return Err(RateLimitExceeded {
                retry_after: bucket.refill_at.saturating_duration_since(now),
            });
        }
        bucket.tokens -= 1;
        Ok(())
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.buckets.len()
    }

    /// Drop every bucket whose interval has run out. Returns how many went.
    pub fn evict_expired(&self) -> usize {
        self.evict_expired_at(Instant::now())
    }

    fn evict_expired_at(&self, now: Instant) -> usize {
        let before = self.buckets.len();
        self.buckets.retain(|_, bucket| bucket.refill_at > now);
        let evicted = before.saturating_sub(self.buckets.len());
        if evicted > 0 {
            debug!(evicted, remaining = self.buckets.len(), "evicted expired rate limit buckets");
        }
        evicted
    }
}

/// Middleware guarding a route with the limiter, keyed by client address.
pub async fn enforce(
    State(limiter): State<Arc<RateLimiter>>,
    ClientIp(ip): ClientIp,
    request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let key = ip.unwrap_or_else(|| "unknown".to_owned());
    if let Err(exceeded) = limiter.check(&key) {
        warn!(client = %key, "rate limit exceeded");
        return Err(ServerError::RateLimited {
            retry_after: whole_seconds(exceeded.retry_after),
        });
    }
    Ok(next.run(request).await)
}

/// Rounded up, never below one second.
fn whole_seconds(duration: Duration) -> u64 {
    let secs = duration.as_secs();
    let secs = if duration.subsec_nanos() > 0 { secs + 1 } else { secs };
    secs.max(1)
}
