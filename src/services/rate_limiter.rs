use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

/// Production posture: 10 runs per user per hour, one slot back every 6
/// minutes.
pub const DEFAULT_CAPACITY: f64 = 10.0;
pub const DEFAULT_REFILL_PER_MS: f64 = 10.0 / (60.0 * 60.0 * 1000.0);

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub capacity: f64,
    pub refill_rate_per_ms: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        RateLimitConfig {
            capacity: DEFAULT_CAPACITY,
            refill_rate_per_ms: DEFAULT_REFILL_PER_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateDecision {
    pub allowed: bool,
    pub remaining: u32,
}

struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Per-key token bucket. Check-and-debit happens under one lock, so it is
/// atomic within this process; running more than one instance needs a
/// shared-store counter instead.
pub struct RateLimiter {
    config: RateLimitConfig,
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        RateLimiter {
            config,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    pub fn consume(&self, key: &str, n: u32) -> RateDecision {
        self.consume_at(key, n, Instant::now())
    }

    fn consume_at(&self, key: &str, n: u32, now: Instant) -> RateDecision {
        // A thread that panicked mid-update only leaves a stale balance
        // behind; keep gating instead of panicking on the poisoned lock.
        let mut buckets = self.buckets.lock().unwrap_or_else(|e| e.into_inner());
        let bucket = buckets.entry(key.to_string()).or_insert(Bucket {
            tokens: self.config.capacity,
            last_refill: now,
        });

        let elapsed_ms = now.duration_since(bucket.last_refill).as_millis() as f64;
        bucket.tokens = (bucket.tokens + elapsed_ms * self.config.refill_rate_per_ms)
            .min(self.config.capacity);
        bucket.last_refill = now;

        let cost = n as f64;
        if bucket.tokens >= cost {
            bucket.tokens -= cost;
            RateDecision {
                allowed: true,
                remaining: bucket.tokens.floor() as u32,
            }
        } else {
            RateDecision {
                allowed: false,
                remaining: bucket.tokens.floor() as u32,
            }
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        RateLimiter::new(RateLimitConfig::default())
    }
}
