//! Optimistic sync configuration.

use serde::{Deserialize, Serialize};

/// How local state reacts to remote failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Revert the optimistic local change when the store rejects it.
    ///
    /// When `false`, local state stays diverged until the next full load.
    #[serde(default = "default_true")]
    pub rollback_on_failure: bool,
    /// Capacity of the notice broadcast channel.
    #[serde(default = "default_notice_buffer")]
    pub notice_buffer: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            rollback_on_failure: default_true(),
            notice_buffer: default_notice_buffer(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_notice_buffer() -> usize {
    64
}
