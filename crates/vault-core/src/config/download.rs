//! Bulk download configuration.

use serde::{Deserialize, Serialize};

/// Packaging of bulk downloads into a single archive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Archive file name prefix; the final name is `<prefix>-<millis>.zip`.
    #[serde(default = "default_archive_prefix")]
    pub archive_prefix: String,
    /// Directory archives are saved into by the CLI.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    /// Maximum number of item fetches in flight at once.
    #[serde(default = "default_concurrency")]
    pub max_concurrent_fetches: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            archive_prefix: default_archive_prefix(),
            output_dir: default_output_dir(),
            max_concurrent_fetches: default_concurrency(),
        }
    }
}

fn default_archive_prefix() -> String {
    "modelvault-batch".to_string()
}

fn default_output_dir() -> String {
    ".".to_string()
}

fn default_concurrency() -> usize {
    4
}
