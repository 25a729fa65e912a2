//! Provider selection from configuration.

use std::sync::Arc;

use tracing::info;

use vault_core::config::remote::RemoteConfig;
use vault_core::error::AppError;
use vault_core::result::AppResult;

use crate::providers::MemoryStore;
use crate::store::RemoteStore;

/// Build the remote store named by `config.provider`.
pub fn connect(config: &RemoteConfig) -> AppResult<Arc<dyn RemoteStore>> {
    let store: Arc<dyn RemoteStore> = match config.provider.as_str() {
        "memory" => Arc::new(MemoryStore::new(config.memory_capacity_bytes)),
        #[cfg(feature = "http")]
        "http" => Arc::new(crate::providers::HttpStore::new(config)?),
        other => {
            return Err(AppError::configuration(format!(
                "Unknown remote provider '{other}'"
            )));
        }
    };
    info!(provider = store.provider_type(), "Remote store configured");
    Ok(store)
}
