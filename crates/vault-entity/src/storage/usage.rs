//! Storage usage value object.

use serde::{Deserialize, Serialize};

/// Used and total capacity reported by the remote store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageUsage {
    /// Bytes currently used.
    pub used: u64,
    /// Total capacity in bytes.
    pub total: u64,
}

impl StorageUsage {
    /// Create a usage summary.
    pub fn new(used: u64, total: u64) -> Self {
        Self { used, total }
    }

    /// Remaining bytes (never negative).
    pub fn free(&self) -> u64 {
        self.total.saturating_sub(self.used)
    }

    /// Usage percentage (0.0 - 100.0); zero when the total is unknown.
    pub fn percent_used(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.used as f64 / self.total as f64) * 100.0
        }
    }

    /// Check if adding the given number of bytes would exceed capacity.
    pub fn would_exceed(&self, additional_bytes: u64) -> bool {
        self.total > 0 && self.used.saturating_add(additional_bytes) > self.total
    }
}
