//! Fixed-window rate limiting for cart endpoints.
//!
//! A courtesy throttle, not a correctness mechanism: counts live in process
//! memory and reset when the window closes. Each key is `cart:{action}:{ip}`.
//!
//! Policies (per client, per 60 second window):
//! - `create`: 10 requests
//! - `read`: 30 requests
//! - `add` / `update` / `remove`: 20 requests each

use std::time::{Duration, Instant};

use moka::Expiry;
use moka::future::Cache;
use moka::ops::compute::{CompResult, Op};

use crate::error::AppError;

const WINDOW: Duration = Duration::from_secs(60);
const MAX_TRACKED_KEYS: u64 = 100_000;

// =============================================================================
// Policies
// =============================================================================

/// A limit applied to one cart action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatePolicy {
    /// Action name, part of the bucket key.
    pub action: &'static str,
    /// Requests allowed per window.
    pub limit: u32,
    /// Window length.
    pub window: Duration,
}

impl RatePolicy {
    pub const CART_CREATE: Self = Self::per_minute("create", 10);
    pub const CART_READ: Self = Self::per_minute("read", 30);
    pub const CART_ADD: Self = Self::per_minute("add", 20);
    pub const CART_UPDATE: Self = Self::per_minute("update", 20);
    pub const CART_REMOVE: Self = Self::per_minute("remove", 20);

    const fn per_minute(action: &'static str, limit: u32) -> Self {
        Self {
            action,
            limit,
            window: WINDOW,
        }
    }

    /// Bucket key for a client.
    #[must_use]
    pub fn key(&self, client: &str) -> String {
        format!("cart:{}:{client}", self.action)
    }
}

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_at: Instant,
}

impl RateLimitDecision {
    /// Whole seconds until the window resets, rounded up, at least one.
    #[must_use]
    pub fn retry_after_secs(&self, now: Instant) -> u64 {
        let millis = self.reset_at.saturating_duration_since(now).as_millis();
        u64::try_from(millis.div_ceil(1_000)).unwrap_or(u64::MAX).max(1)
    }
}

// =============================================================================
// Limiter
// =============================================================================

#[derive(Debug, Clone, Copy)]
struct Bucket {
    count: u32,
    reset_at: Instant,
}

/// Evicts each bucket when its window closes.
struct WindowExpiry;

impl Expiry<String, Bucket> for WindowExpiry {
    fn expire_after_create(&self, _key: &String, value: &Bucket, created_at: Instant) -> Option<Duration> {
        Some(value.reset_at.saturating_duration_since(created_at))
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Bucket,
        updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.reset_at.saturating_duration_since(updated_at))
    }
}

/// In-memory fixed-window counter keyed by client and action.
///
/// Cheap to clone; clones share buckets.
#[derive(Clone)]
pub struct FixedWindowLimiter {
    buckets: Cache<String, Bucket>,
}

impl Default for FixedWindowLimiter {
    fn default() -> Self {
        Self::new(MAX_TRACKED_KEYS)
    }
}

impl FixedWindowLimiter {
    /// Create a limiter tracking at most `max_keys` live buckets.
    #[must_use]
    pub fn new(max_keys: u64) -> Self {
        Self {
            buckets: Cache::builder()
                .max_capacity(max_keys)
                .expire_after(WindowExpiry)
                .build(),
        }
    }

    /// Count one request against `key`.
    ///
    /// The first request (or the first after the window closed) opens a new
    /// window. Once `limit` requests are counted, further requests are denied
    /// without being counted until the window resets.
    pub async fn check(&self, key: String, policy: &RatePolicy) -> RateLimitDecision {
        let now = Instant::now();
        let limit = policy.limit;
        let window = policy.window;

        let result = self
            .buckets
            .entry(key)
            .and_compute_with(|existing| {
                let op = match existing.map(|entry| entry.into_value()) {
                    Some(bucket) if bucket.reset_at > now && bucket.count >= limit => Op::Nop,
                    Some(bucket) if bucket.reset_at > now => Op::Put(Bucket {
                        count: bucket.count + 1,
                        reset_at: bucket.reset_at,
                    }),
                    _ => Op::Put(Bucket {
                        count: 1,
                        reset_at: now + window,
                    }),
                };
                std::future::ready(op)
            })
            .await;

        match result {
            CompResult::Inserted(entry) | CompResult::ReplacedWith(entry) => {
                let bucket = entry.into_value();
                RateLimitDecision {
                    allowed: true,
                    remaining: limit.saturating_sub(bucket.count),
                    reset_at: bucket.reset_at,
                }
            }
            CompResult::Unchanged(entry) => RateLimitDecision {
                allowed: false,
                remaining: 0,
                reset_at: entry.into_value().reset_at,
            },
            // Never produced by the closure above; fail open.
            CompResult::Removed(_) | CompResult::StillNone(_) => RateLimitDecision {
                allowed: true,
                remaining: limit.saturating_sub(1),
                reset_at: now + window,
            },
        }
    }

    /// Count a request for `client` under `policy`, failing when over limit.
    ///
    /// # Errors
    ///
    /// Returns `AppError::RateLimited` carrying the seconds until reset.
    pub async fn enforce(&self, policy: &RatePolicy, client: &str) -> Result<RateLimitDecision, AppError> {
        let decision = self.check(policy.key(client), policy).await;
        if decision.allowed {
            return Ok(decision);
        }

        let retry_after_secs = decision.retry_after_secs(Instant::now());
        tracing::warn!(
            action = policy.action,
            client = %client,
            retry_after_secs,
            "Rate limit exceeded"
        );
        Err(AppError::RateLimited { retry_after_secs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIGHT: RatePolicy = RatePolicy {
        action: "test",
        limit: 2,
        window: Duration::from_millis(150),
    };

    #[test]
    fn test_policy_keys() {
        assert_eq!(RatePolicy::CART_ADD.key("203.0.113.7"), "cart:add:203.0.113.7");
        assert_eq!(RatePolicy::CART_CREATE.limit, 10);
        assert_eq!(RatePolicy::CART_READ.limit, 30);
    }

    #[tokio::test]
    async fn test_counts_down_then_denies() {
        let limiter = FixedWindowLimiter::default();

        let first = limiter.check("k".to_string(), &TIGHT).await;
        assert!(first.allowed);
        assert_eq!(first.remaining, 1);

        let second = limiter.check("k".to_string(), &TIGHT).await;
        assert!(second.allowed);
        assert_eq!(second.remaining, 0);
        assert_eq!(second.reset_at, first.reset_at);

        let third = limiter.check("k".to_string(), &TIGHT).await;
        assert!(!third.allowed);
        assert_eq!(third.remaining, 0);
        assert_eq!(third.reset_at, first.reset_at);
    }

    #[tokio::test]
    async fn test_window_resets() {
        let limiter = FixedWindowLimiter::default();
        for _ in 0..3 {
            limiter.check("k".to_string(), &TIGHT).await;
        }

        tokio::time::sleep(Duration::from_millis(250)).await;

        let decision = limiter.check("k".to_string(), &TIGHT).await;
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 1);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let limiter = FixedWindowLimiter::default();
        for _ in 0..3 {
            limiter.check("a".to_string(), &TIGHT).await;
        }
        assert!(limiter.check("b".to_string(), &TIGHT).await.allowed);
    }

    #[tokio::test]
    async fn test_enforce_reports_retry_after() {
        let limiter = FixedWindowLimiter::default();
        for _ in 0..10 {
            assert!(limiter.enforce(&RatePolicy::CART_CREATE, "1.2.3.4").await.is_ok());
        }

        match limiter.enforce(&RatePolicy::CART_CREATE, "1.2.3.4").await {
            Err(AppError::RateLimited { retry_after_secs }) => {
                assert!((1..=60).contains(&retry_after_secs));
            }
            other => panic!("expected RateLimited, got {other:?}"),
        }

        // Other actions keep their own budget.
        assert!(limiter.enforce(&RatePolicy::CART_READ, "1.2.3.4").await.is_ok());
    }

    #[test]
    fn test_retry_after_rounds_up() {
        let now = Instant::now();
        let decision = RateLimitDecision {
            allowed: false,
            remaining: 0,
            reset_at: now + Duration::from_millis(1_200),
        };
        assert_eq!(decision.retry_after_secs(now), 2);

        let expired = RateLimitDecision {
            reset_at: now,
            ..decision
        };
        assert_eq!(expired.retry_after_secs(now), 1);
    }
}
