//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section, and every field carries a serde default so an empty file (or
//! no file at all) yields a working configuration.

pub mod download;
pub mod logging;
pub mod remote;
pub mod sync;

use serde::{Deserialize, Serialize};

use self::download::DownloadConfig;
use self::logging::LoggingConfig;
use self::remote::RemoteConfig;
use self::sync::SyncConfig;

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Remote store connection settings.
    #[serde(default)]
    pub remote: RemoteConfig,
    /// Optimistic sync behavior.
    #[serde(default)]
    pub sync: SyncConfig,
    /// Bulk download packaging.
    #[serde(default)]
    pub download: DownloadConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// The file is optional. Values are overlaid with environment variables
    /// prefixed with `MODELVAULT__` (e.g. `MODELVAULT__REMOTE__BASE_URL`).
    pub fn load(path: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("MODELVAULT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}
