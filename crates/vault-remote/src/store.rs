//! Remote store trait: the source of truth for folders and items.

use async_trait::async_trait;
use bytes::Bytes;

use vault_core::result::AppResult;
use vault_core::types::{FolderId, ItemId};
use vault_entity::folder::Folder;
use vault_entity::item::{FileBlob, Item, ItemPatch, UploadItem};
use vault_entity::storage::StorageUsage;

/// Trait for remote store backends.
///
/// Any RPC or REST binding is acceptable as long as it honors these
/// operation contracts. Implementations exist for HTTP and in-memory
/// stores in this crate.
#[async_trait]
pub trait RemoteStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g., "http", "memory").
    fn provider_type(&self) -> &str;

    /// List every folder.
    async fn list_folders(&self) -> AppResult<Vec<Folder>>;

    /// Create a folder under `parent_id` (None for root level).
    async fn create_folder(&self, name: &str, parent_id: Option<&FolderId>) -> AppResult<Folder>;

    /// Rename a folder.
    async fn rename_folder(&self, id: &FolderId, name: &str) -> AppResult<Folder>;

    /// Delete a folder. Must fail if it still has items or child folders.
    async fn delete_folder(&self, id: &FolderId) -> AppResult<()>;

    /// List items, optionally restricted to one folder.
    async fn list_items(&self, folder_id: Option<&FolderId>) -> AppResult<Vec<Item>>;

    /// Store a new item.
    async fn upload_item(&self, upload: UploadItem) -> AppResult<Item>;

    /// Apply a partial update to an item.
    async fn update_item(&self, id: &ItemId, patch: &ItemPatch) -> AppResult<Item>;

    /// Delete a single item.
    async fn delete_item(&self, id: &ItemId) -> AppResult<()>;

    /// Replace an item's binary content, keeping its id.
    async fn replace_item_content(
        &self,
        id: &ItemId,
        file: FileBlob,
        thumbnail: Option<String>,
    ) -> AppResult<Item>;

    /// Fetch an item's binary content.
    async fn download_item(&self, id: &ItemId) -> AppResult<Bytes>;

    /// Delete many items in one call.
    async fn bulk_delete_items(&self, ids: &[ItemId]) -> AppResult<()>;

    /// Move many items into one folder in one call.
    async fn bulk_move_items(&self, ids: &[ItemId], folder_id: &FolderId) -> AppResult<()>;

    /// Union tags into many items in one call.
    async fn bulk_tag_items(&self, ids: &[ItemId], tags: &[String]) -> AppResult<()>;

    /// Import a model from a public URL into a folder.
    async fn import_from_url(&self, url: &str, folder_id: &FolderId) -> AppResult<Item>;

    /// Used and total capacity.
    async fn storage_usage(&self) -> AppResult<StorageUsage>;
}
