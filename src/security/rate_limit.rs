//! Per-client token bucket admission control.
//!
//! One bucket per client key, created on first sight with a full budget of
//! `requests_per_minute` tokens. Each admitted request spends one token.
//!
//! # Concurrency
//! Buckets live in a `DashMap`; the refill-and-spend step for a key runs under
//! that key's shard lock, so unrelated keys rarely contend. Inserting a new key
//! additionally takes `insert_lock`, which is the only place the map size cap
//! is enforced.
//!
//! # Eviction
//! A bucket untouched for `idle_timeout` can be dropped at any time, by the
//! periodic sweep or when a new key needs room. If the map is still full after
//! that, the least recently used bucket goes. A dropped key simply starts over
//! with a full budget.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::{RateLimitConfig, RefillMode};
use crate::observability::metrics;
use crate::security::clock::{Clock, SystemClock};

/// Refill window. The configured limit is per this window.
pub const WINDOW: Duration = Duration::from_secs(60);

/// Result of one admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    /// Whole tokens left after this call; 0 when denied.
    pub remaining: u32,
    pub limit: u32,
    /// Time until one token is available. Zero when allowed.
    pub retry_after: Duration,
}

impl Decision {
    /// `retry_after` rounded up to whole seconds, at least 1 when denied.
    pub fn retry_after_secs(&self) -> u64 {
        if self.allowed {
            return 0;
        }
        let secs = self.retry_after.as_secs() + u64::from(self.retry_after.subsec_nanos() > 0);
        secs.max(1)
    }
}

#[derive(Debug, Clone)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
    last_seen: Instant,
}

impl TokenBucket {
    fn new(capacity: f64, now: Instant) -> Self {
        Self {
            tokens: capacity,
            last_refill: now,
            last_seen: now,
        }
    }

    fn refill(&mut self, mode: RefillMode, capacity: f64, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill);
        match mode {
            RefillMode::Interval => {
                let windows = (elapsed.as_nanos() / WINDOW.as_nanos()) as u32;
                if windows > 0 {
                    self.tokens = capacity;
                    self.last_refill += WINDOW * windows;
                }
            }
            RefillMode::Greedy => {
                let earned = elapsed.as_secs_f64() * capacity / WINDOW.as_secs_f64();
                self.tokens = (self.tokens + earned).min(capacity);
                self.last_refill = now;
            }
        }
    }

    fn time_to_next_token(&self, mode: RefillMode, capacity: f64, now: Instant) -> Duration {
        match mode {
            RefillMode::Interval => (self.last_refill + WINDOW).saturating_duration_since(now),
            RefillMode::Greedy => {
                let missing = (1.0 - self.tokens).max(0.0);
                Duration::from_secs_f64(missing * WINDOW.as_secs_f64() / capacity)
            }
        }
    }

    fn try_acquire(&mut self, mode: RefillMode, capacity: f64, now: Instant) -> Result<u32, Duration> {
        self.refill(mode, capacity, now);
        self.last_seen = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(self.tokens.floor() as u32)
        } else {
            Err(self.time_to_next_token(mode, capacity, now))
        }
    }
}

/// Keyed token bucket limiter.
pub struct RateLimiter {
    buckets: DashMap<String, TokenBucket>,
    insert_lock: Mutex<()>,
    limit: u32,
    refill: RefillMode,
    idle_timeout: Duration,
    max_keys: usize,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            buckets: DashMap::new(),
            insert_lock: Mutex::new(()),
            limit: config.requests_per_minute.max(1),
            refill: config.refill,
            idle_timeout: Duration::from_secs(config.idle_timeout_secs),
            max_keys: config.max_tracked_keys.max(1),
            clock,
        }
    }

    /// Configured requests per window.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of clients currently holding a bucket.
    pub fn tracked_keys(&self) -> usize {
        self.buckets.len()
    }

    /// Spend one token for `key` if it has one.
    pub fn admit(&self, key: &str) -> Decision {
        let now = self.clock.now();
        let capacity = f64::from(self.limit);

        if let Some(mut bucket) = self.buckets.get_mut(key) {
            return self.decide(bucket.try_acquire(self.refill, capacity, now));
        }

        let _guard = self
            .insert_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !self.buckets.contains_key(key) {
            self.make_room(now);
        }
        let mut bucket = self
            .buckets
            .entry(key.to_string())
            .or_insert_with(|| TokenBucket::new(capacity, now));
        self.decide(bucket.try_acquire(self.refill, capacity, now))
    }

    fn decide(&self, outcome: Result<u32, Duration>) -> Decision {
        match outcome {
            Ok(remaining) => Decision {
                allowed: true,
                remaining,
                limit: self.limit,
                retry_after: Duration::ZERO,
            },
            Err(retry_after) => Decision {
                allowed: false,
                remaining: 0,
                limit: self.limit,
                retry_after,
            },
        }
    }

    /// Drop every bucket idle for at least `idle_timeout`. Returns how many went.
    pub fn evict_idle(&self) -> usize {
        self.evict_idle_at(self.clock.now())
    }

    fn evict_idle_at(&self, now: Instant) -> usize {
        let before = self.buckets.len();
        let idle_timeout = self.idle_timeout;
        self.buckets
            .retain(|_, bucket| now.saturating_duration_since(bucket.last_seen) < idle_timeout);
        before.saturating_sub(self.buckets.len())
    }

    // Caller holds `insert_lock`.
    fn make_room(&self, now: Instant) {
        if self.buckets.len() < self.max_keys {
            return;
        }
        let evicted = self.evict_idle_at(now);
        if evicted > 0 {
            tracing::debug!(evicted, "Evicted idle rate limit buckets");
        }

        while self.buckets.len() >= self.max_keys {
            let victim = self
                .buckets
                .iter()
                .min_by_key(|entry| entry.value().last_seen)
                .map(|entry| (entry.key().clone(), entry.value().last_seen));
            let Some((key, seen)) = victim else {
                break;
            };
            // Skip if the bucket was touched after we picked it.
            if self
                .buckets
                .remove_if(&key, |_, bucket| bucket.last_seen == seen)
                .is_some()
            {
                tracing::debug!(client = %key, "Evicted least recently used rate limit bucket");
            }
        }
    }

    /// Run `evict_idle` every `period` until shutdown fires.
    pub fn spawn_sweeper(
        self: Arc<Self>,
        period: Duration,
        mut shutdown: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let evicted = self.evict_idle();
                        metrics::record_tracked_keys(self.tracked_keys());
                        if evicted > 0 {
                            tracing::debug!(evicted, tracked = self.tracked_keys(), "Idle sweep");
                        }
                    }
                    _ = shutdown.recv() => break,
                }
            }
        })
    }
}
