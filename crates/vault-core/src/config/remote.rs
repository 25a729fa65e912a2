//! Remote store configuration.

use serde::{Deserialize, Serialize};

/// Which store backs the library, and how to reach it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Provider type: `"http"` or `"memory"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Base URL of the HTTP API (the `/api` suffix is appended).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Capacity reported by the in-memory store.
    #[serde(default = "default_memory_capacity")]
    pub memory_capacity_bytes: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
            memory_capacity_bytes: default_memory_capacity(),
        }
    }
}

fn default_provider() -> String {
    "http".to_string()
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_memory_capacity() -> u64 {
    5_368_709_120 // 5 GB
}
