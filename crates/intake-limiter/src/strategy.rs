//! # Admission Strategies
//!
//! The three window disciplines a limiter can enforce, and the per-key
//! state machine behind each one.
//!
//! ## Design
//!
//! | Strategy | State per key | Trade-off |
//! |----------|---------------|-----------|
//! | Fixed window | `(window_start, count)` | Cheapest; bursts at window edges |
//! | Sliding window | bounded timestamp deque | Exact; memory grows with limit |
//! | Token bucket | `(tokens, last_refill)` | Smooth rate with burst headroom |
//!
//! All three answer the same question — may this request proceed now —
//! and update their state in the same call. Admission and bookkeeping
//! are never split into separate read-then-write steps visible to other
//! callers; the limiter holds its table lock across the whole decision.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Window discipline for a limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RateLimitStrategy {
    /// Count within a window that resets wholesale when it expires.
    #[default]
    FixedWindow,
    /// Count of timestamps within a trailing window.
    SlidingWindow,
    /// Continuous refill at `limit / window` tokens per second.
    TokenBucket,
}

/// Immutable limiter configuration.
///
/// Changing limits requires constructing a new limiter; there is no
/// mutation path by design.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Window discipline.
    pub strategy: RateLimitStrategy,
    /// Requests admitted per window.
    pub limit: u32,
    /// Window length in seconds.
    pub window_seconds: f64,
    /// Extra requests admitted beyond `limit` before denial.
    pub burst_allowance: u32,
}

impl RateLimitConfig {
    /// Creates a config with the given limit and window, fixed-window
    /// discipline and no burst.
    #[must_use]
    pub const fn new(limit: u32, window_seconds: f64) -> Self {
        Self {
            strategy: RateLimitStrategy::FixedWindow,
            limit,
            window_seconds,
            burst_allowance: 0,
        }
    }

    /// Sets the window discipline.
    #[must_use]
    pub const fn with_strategy(mut self, strategy: RateLimitStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the burst allowance.
    #[must_use]
    pub const fn with_burst(mut self, burst: u32) -> Self {
        self.burst_allowance = burst;
        self
    }

    /// Effective admission ceiling: limit plus burst headroom.
    #[must_use]
    pub const fn effective_limit(&self) -> u32 {
        self.limit + self.burst_allowance
    }

    /// Window length as a [`Duration`].
    #[must_use]
    pub fn window(&self) -> Duration {
        Duration::from_secs_f64(self.window_seconds)
    }
}

impl Default for RateLimitConfig {
    /// 60 requests per 60-second fixed window, no burst.
    fn default() -> Self {
        Self::new(60, 60.0)
    }
}

/// Per-key window state. One exists per caller key, created lazily on
/// the key's first check.
#[derive(Debug, Clone)]
pub(crate) enum KeyState {
    Fixed {
        window_start: Instant,
        count: u32,
    },
    Sliding {
        hits: VecDeque<Instant>,
    },
    Bucket {
        tokens: f64,
        last_refill: Instant,
    },
}

/// Outcome of one admission decision inside the state machine.
pub(crate) struct Admission {
    pub allowed: bool,
    pub remaining: u32,
    /// Time from `now` until the key's state next frees a slot.
    pub retry_after: Duration,
}

impl KeyState {
    /// Fresh state for a key under the given config.
    pub(crate) fn new(config: &RateLimitConfig, now: Instant) -> Self {
        match config.strategy {
            RateLimitStrategy::FixedWindow => Self::Fixed {
                window_start: now,
                count: 0,
            },
            RateLimitStrategy::SlidingWindow => Self::Sliding {
                hits: VecDeque::with_capacity(config.effective_limit() as usize),
            },
            RateLimitStrategy::TokenBucket => Self::Bucket {
                tokens: f64::from(config.effective_limit()),
                last_refill: now,
            },
        }
    }

    /// The atomic read-modify-write: decides admission and updates the
    /// window state in one step. Denied requests do not consume a slot.
    pub(crate) fn admit(&mut self, config: &RateLimitConfig, now: Instant) -> Admission {
        let window = config.window();
        let ceiling = config.effective_limit();

        match self {
            Self::Fixed {
                window_start,
                count,
            } => {
                if now.duration_since(*window_start) >= window {
                    *window_start = now;
                    *count = 0;
                }
                let allowed = *count < ceiling;
                if allowed {
                    *count += 1;
                }
                Admission {
                    allowed,
                    remaining: ceiling.saturating_sub(*count),
                    retry_after: window.saturating_sub(now.duration_since(*window_start)),
                }
            }
            Self::Sliding { hits } => {
                while hits
                    .front()
                    .is_some_and(|t| now.duration_since(*t) >= window)
                {
                    hits.pop_front();
                }
                let allowed = (hits.len() as u32) < ceiling;
                if allowed {
                    hits.push_back(now);
                }
                let retry_after = hits
                    .front()
                    .map(|t| window.saturating_sub(now.duration_since(*t)))
                    .unwrap_or_default();
                Admission {
                    allowed,
                    remaining: ceiling.saturating_sub(hits.len() as u32),
                    retry_after,
                }
            }
            Self::Bucket {
                tokens,
                last_refill,
            } => {
                let rate = f64::from(config.limit) / config.window_seconds;
                let elapsed = now.duration_since(*last_refill).as_secs_f64();
                *tokens = (*tokens + elapsed * rate).min(f64::from(ceiling));
                *last_refill = now;

                let allowed = *tokens >= 1.0;
                if allowed {
                    *tokens -= 1.0;
                }
                let deficit = 1.0 - *tokens;
                let retry_after = if allowed || rate <= 0.0 {
                    Duration::ZERO
                } else {
                    Duration::from_secs_f64(deficit / rate)
                };
                Admission {
                    allowed,
                    remaining: tokens.floor().max(0.0) as u32,
                    retry_after,
                }
            }
        }
    }
}
