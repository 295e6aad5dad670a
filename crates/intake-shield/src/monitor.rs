//! # Security Monitor
//!
//! Append-only attack counters for observability and audit. Counts are
//! incremented exactly once per confirmed detection per sanitize call,
//! never decremented, and reset only by explicit operator action. The
//! summary is a read-only snapshot — it exists for dashboards and
//! audits, never for control flow.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Read-only snapshot of the attack counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecuritySummary {
    /// Sum of all category counts.
    pub total_attacks: u64,
    /// Count per attack-category label.
    pub attack_counts: HashMap<String, u64>,
}

/// Process-wide attack accounting.
///
/// # Thread Safety
///
/// Safe to share behind an `Arc`. Each increment is one atomic
/// read-modify-write under the counter lock; categories are independent
/// and order between them does not matter, so a single coarse lock is
/// sufficient.
#[derive(Debug, Default)]
pub struct SecurityMonitor {
    counts: Mutex<HashMap<String, u64>>,
}

impl SecurityMonitor {
    /// Creates a monitor with empty counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the counter for `category` by one.
    pub fn record(&self, category: &str) {
        let mut counts = self.counts.lock();
        *counts.entry(category.to_string()).or_insert(0) += 1;
    }

    /// Current count for `category`.
    #[must_use]
    pub fn count(&self, category: &str) -> u64 {
        self.counts.lock().get(category).copied().unwrap_or(0)
    }

    /// Snapshot of all counters.
    #[must_use]
    pub fn summary(&self) -> SecuritySummary {
        let counts = self.counts.lock();
        SecuritySummary {
            total_attacks: counts.values().sum(),
            attack_counts: counts.clone(),
        }
    }

    /// Clears all counters.
    ///
    /// Operator surface only; nothing on the request path calls this.
    pub fn reset_counts(&self) {
        self.counts.lock().clear();
    }
}
