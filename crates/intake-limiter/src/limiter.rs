//! # Keyed Rate Limiter
//!
//! Per-caller admission control. One limiter serves a whole process;
//! state is keyed by caller identity (session or user id) and lives for
//! the limiter's lifetime unless explicitly reset.
//!
//! ## Security Notes
//!
//! - `check` reads and updates the key's window state under one lock
//!   acquisition; there is no window in which a concurrent caller can
//!   observe the count before the increment lands
//! - Denied requests consume no slot — retrying while limited cannot
//!   extend the penalty
//! - `reset` is an operator/test surface, never called on the hot path
//!
//! ## Example
//!
//! ```rust
//! use intake_limiter::{RateLimitConfig, RateLimiter};
//!
//! let limiter = RateLimiter::new(RateLimitConfig::new(10, 1.0)).unwrap();
//! let status = limiter.check("session-1");
//! assert!(status.allowed);
//! assert_eq!(status.remaining, 9);
//! ```

use std::collections::HashMap;
use std::time::{Duration, Instant, SystemTime};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{LimiterError, Result};
use crate::strategy::{KeyState, RateLimitConfig};

/// Outcome of one admission check. Computed per call; nothing in it is
/// retained beyond the limiter's own window-state update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitStatus {
    /// Whether the request may proceed.
    pub allowed: bool,
    /// Slots left in the current window. Never negative.
    pub remaining: u32,
    /// When the window next frees a slot.
    pub reset_at: SystemTime,
}

/// Per-key admission control with pluggable window discipline.
///
/// # Thread Safety
///
/// Safe to share behind an `Arc`; the key table is guarded by a single
/// mutex held for the duration of each decision.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    table: Mutex<HashMap<String, KeyState>>,
}

impl RateLimiter {
    /// Creates a limiter.
    ///
    /// # Errors
    ///
    /// Rejects configurations that could never admit a request: a zero
    /// limit, or a window that is not a positive finite number.
    pub fn new(config: RateLimitConfig) -> Result<Self> {
        if config.limit == 0 {
            return Err(LimiterError::ZeroLimit(config.limit));
        }
        if !config.window_seconds.is_finite() || config.window_seconds <= 0.0 {
            return Err(LimiterError::InvalidWindow(config.window_seconds));
        }
        Ok(Self {
            config,
            table: Mutex::new(HashMap::new()),
        })
    }

    /// The immutable configuration this limiter was built with.
    #[must_use]
    pub const fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Checks and records one request for `key`.
    ///
    /// Admission and bookkeeping happen in the same operation: by the
    /// time this returns, the slot (if granted) is already consumed.
    pub fn check(&self, key: &str) -> RateLimitStatus {
        self.check_at(key, Instant::now())
    }

    /// [`check`](Self::check) against an explicit clock reading.
    ///
    /// Exists so tests can drive the window state machine without
    /// sleeping; production callers use `check`.
    pub fn check_at(&self, key: &str, now: Instant) -> RateLimitStatus {
        let mut table = self.table.lock();
        let state = table
            .entry(key.to_string())
            .or_insert_with(|| KeyState::new(&self.config, now));
        let admission = state.admit(&self.config, now);
        drop(table);

        if admission.allowed {
            debug!(key, remaining = admission.remaining, "request admitted");
        } else {
            warn!(
                key,
                retry_after_ms = admission.retry_after.as_millis() as u64,
                "request denied by rate limit"
            );
        }

        RateLimitStatus {
            allowed: admission.allowed,
            remaining: admission.remaining,
            reset_at: SystemTime::now() + admission.retry_after,
        }
    }

    /// Time until `key` next frees a slot, without consuming one.
    ///
    /// Returns [`Duration::ZERO`] for unknown keys.
    #[must_use]
    pub fn retry_after(&self, key: &str) -> Duration {
        let now = Instant::now();
        let mut table = self.table.lock();
        match table.get_mut(key) {
            Some(state) => {
                // Probe on a clone so the real state is not mutated.
                let mut probe = state.clone();
                let admission = probe.admit(&self.config, now);
                if admission.allowed {
                    Duration::ZERO
                } else {
                    admission.retry_after
                }
            }
            None => Duration::ZERO,
        }
    }

    /// Clears one key's window state, or the whole table.
    ///
    /// Operator/test surface: the next check for a cleared key starts a
    /// fresh window.
    pub fn reset(&self, key: Option<&str>) {
        let mut table = self.table.lock();
        match key {
            Some(key) => {
                table.remove(key);
                debug!(key, "rate limit state reset");
            }
            None => {
                table.clear();
                debug!("all rate limit state reset");
            }
        }
    }

    /// Number of keys currently tracked.
    #[must_use]
    pub fn tracked_keys(&self) -> usize {
        self.table.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::RateLimitStrategy;
    use std::sync::Arc;

    #[test]
    fn test_limiter_creation() {
        assert!(RateLimiter::new(RateLimitConfig::new(10, 1.0)).is_ok());
        assert_eq!(
            RateLimiter::new(RateLimitConfig::new(0, 1.0)).unwrap_err(),
            LimiterError::ZeroLimit(0)
        );
        assert!(matches!(
            RateLimiter::new(RateLimitConfig::new(10, 0.0)).unwrap_err(),
            LimiterError::InvalidWindow(_)
        ));
        assert!(RateLimiter::new(RateLimitConfig::new(10, f64::NAN)).is_err());
    }

    #[test]
    fn test_fixed_window_fairness() {
        // Exactly N admitted, the (N+1)th denied.
        let limiter = RateLimiter::new(RateLimitConfig::new(10, 60.0)).unwrap();
        let base = Instant::now();

        for i in 0..10 {
            let status = limiter.check_at("alice", base);
            assert!(status.allowed, "call {} should pass", i + 1);
        }
        let status = limiter.check_at("alice", base);
        assert!(!status.allowed);
        assert_eq!(status.remaining, 0);
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = RateLimiter::new(RateLimitConfig::new(1, 60.0)).unwrap();
        let base = Instant::now();

        assert!(limiter.check_at("alice", base).allowed);
        assert!(!limiter.check_at("alice", base).allowed);
        // Bob's window is untouched by Alice's exhaustion
        assert!(limiter.check_at("bob", base).allowed);
        assert_eq!(limiter.tracked_keys(), 2);
    }

    #[test]
    fn test_reset_single_key() {
        let limiter = RateLimiter::new(RateLimitConfig::new(1, 60.0)).unwrap();
        let base = Instant::now();

        assert!(limiter.check_at("alice", base).allowed);
        assert!(!limiter.check_at("alice", base).allowed);

        limiter.reset(Some("alice"));
        assert!(limiter.check_at("alice", base).allowed);
    }

    #[test]
    fn test_reset_all_keys() {
        let limiter = RateLimiter::new(RateLimitConfig::new(1, 60.0)).unwrap();
        let base = Instant::now();

        limiter.check_at("alice", base);
        limiter.check_at("bob", base);
        limiter.reset(None);

        assert_eq!(limiter.tracked_keys(), 0);
        assert!(limiter.check_at("alice", base).allowed);
        assert!(limiter.check_at("bob", base).allowed);
    }

    #[test]
    fn test_window_expiry_restores_allowance() {
        let limiter = RateLimiter::new(RateLimitConfig::new(2, 1.0)).unwrap();
        let base = Instant::now();

        assert!(limiter.check_at("k", base).allowed);
        assert!(limiter.check_at("k", base).allowed);
        assert!(!limiter.check_at("k", base).allowed);

        let later = base + Duration::from_secs_f64(1.5);
        assert!(limiter.check_at("k", later).allowed);
    }

    #[test]
    fn test_sliding_strategy_through_limiter() {
        let config =
            RateLimitConfig::new(2, 1.0).with_strategy(RateLimitStrategy::SlidingWindow);
        let limiter = RateLimiter::new(config).unwrap();
        let base = Instant::now();

        assert!(limiter.check_at("k", base).allowed);
        assert!(limiter
            .check_at("k", base + Duration::from_secs_f64(0.8))
            .allowed);
        // Fixed window would have reset here; sliding still sees both
        assert!(!limiter
            .check_at("k", base + Duration::from_secs_f64(1.1))
            .allowed);
    }

    #[test]
    fn test_retry_after_probe_does_not_consume() {
        let limiter = RateLimiter::new(RateLimitConfig::new(2, 60.0)).unwrap();
        let base = Instant::now();

        limiter.check_at("k", base);
        let _ = limiter.retry_after("k");
        // Probe must not have eaten the second slot
        assert!(limiter.check_at("k", base).allowed);
    }

    #[test]
    fn test_security_concurrent_checks_cannot_exceed_limit() {
        // 8 threads hammering one key: admissions must total exactly
        // the configured limit.
        let limiter = Arc::new(RateLimiter::new(RateLimitConfig::new(100, 3600.0)).unwrap());
        let base = Instant::now();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || {
                    let mut admitted = 0u32;
                    for _ in 0..50 {
                        if limiter.check_at("shared", base).allowed {
                            admitted += 1;
                        }
                    }
                    admitted
                })
            })
            .collect();

        let total: u32 = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(total, 100, "concurrent checks let callers bypass the limit");
    }
}
