//! In-process remote store.
//!
//! Holds folders, items, and content in memory behind an async lock. It
//! honors the same contracts as the HTTP backend (including the
//! non-empty-folder rule) and records every call so tests can assert how
//! many round trips an operation cost. Failures can be injected per
//! operation.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use vault_core::error::AppError;
use vault_core::result::AppResult;
use vault_core::types::{FolderId, ItemId};
use vault_entity::folder::Folder;
use vault_entity::item::{FileBlob, Item, ItemPatch, UploadItem};
use vault_entity::storage::StorageUsage;

use crate::store::RemoteStore;

/// A call observed by the memory store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// Operation name (e.g. `"bulk_move_items"`).
    pub operation: &'static str,
    /// Ids the call carried, in order.
    pub ids: Vec<String>,
}

#[derive(Debug, Default)]
struct MemoryState {
    folders: Vec<Folder>,
    items: Vec<Item>,
    content: HashMap<ItemId, Bytes>,
}

/// In-memory remote store.
#[derive(Debug)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
    capacity: u64,
    calls: Mutex<Vec<RecordedCall>>,
    failing: Mutex<HashSet<&'static str>>,
}

impl MemoryStore {
    /// Create an empty store with the given capacity in bytes.
    pub fn new(capacity: u64) -> Self {
        Self {
            state: RwLock::new(MemoryState::default()),
            capacity,
            calls: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
        }
    }

    /// Create a store pre-populated with folders.
    pub fn with_folders(capacity: u64, folders: Vec<Folder>) -> Self {
        Self {
            state: RwLock::new(MemoryState {
                folders,
                ..MemoryState::default()
            }),
            ..Self::new(capacity)
        }
    }

    /// Seed an item with content, bypassing call recording.
    pub async fn seed_item(&self, item: Item, content: impl Into<Bytes>) {
        let mut state = self.state.write().await;
        state.content.insert(item.id.clone(), content.into());
        state.items.push(item);
    }

    /// Make every future call to `operation` fail with an external error.
    pub fn fail_operation(&self, operation: &'static str) {
        self.failing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(operation);
    }

    /// Stop failing `operation`.
    pub fn restore_operation(&self, operation: &'static str) {
        self.failing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(operation);
    }

    /// Every call observed so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Calls of one operation.
    pub fn calls_for(&self, operation: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.operation == operation)
            .collect()
    }

    /// Number of calls observed, excluding reads.
    pub fn mutation_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| {
                !matches!(
                    c.operation,
                    "list_folders" | "list_items" | "download_item" | "storage_usage"
                )
            })
            .count()
    }

    /// Snapshot of the stored folders.
    pub async fn folders(&self) -> Vec<Folder> {
        self.state.read().await.folders.clone()
    }

    /// Snapshot of the stored items.
    pub async fn items(&self) -> Vec<Item> {
        self.state.read().await.items.clone()
    }

    /// Record a call and fail it if injection is active.
    fn enter(&self, operation: &'static str, ids: Vec<String>) -> AppResult<()> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RecordedCall { operation, ids });
        let failing = self
            .failing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(operation);
        if failing {
            debug!(operation, "Injected memory store failure");
            return Err(AppError::external(format!("{operation} failed: injected failure")));
        }
        Ok(())
    }

    fn new_item(file: &FileBlob, folder_id: FolderId, thumbnail: Option<String>) -> Item {
        let id = ItemId::generate();
        Item {
            url: Some(format!("memory://items/{id}")),
            id,
            name: file.name.clone(),
            folder_id,
            size: file.size(),
            date_added: Utc::now().timestamp_millis(),
            tags: Default::default(),
            description: String::new(),
            thumbnail,
            dimensions: None,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(5 * 1024 * 1024 * 1024)
    }
}

/// Derive a readable model name from a model-sharing URL.
///
/// `.../model/12345-my-cool-model` becomes `My Cool Model`.
fn name_from_url(url: &str) -> String {
    url.split('/')
        .find_map(|segment| {
            let (digits, rest) = segment.split_once('-')?;
            if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) || rest.is_empty() {
                return None;
            }
            let words: Vec<String> = rest
                .split('-')
                .filter(|w| !w.is_empty())
                .map(|w| {
                    let mut chars = w.chars();
                    match chars.next() {
                        Some(first) => first.to_uppercase().chain(chars).collect(),
                        None => String::new(),
                    }
                })
                .collect();
            Some(words.join(" "))
        })
        .unwrap_or_else(|| "Imported Model".to_string())
}

#[async_trait]
impl RemoteStore for MemoryStore {
    fn provider_type(&self) -> &str {
        "memory"
    }

    async fn list_folders(&self) -> AppResult<Vec<Folder>> {
        self.enter("list_folders", Vec::new())?;
        Ok(self.state.read().await.folders.clone())
    }

    async fn create_folder(&self, name: &str, parent_id: Option<&FolderId>) -> AppResult<Folder> {
        self.enter("create_folder", parent_id.map(|p| p.to_string()).into_iter().collect())?;
        let mut state = self.state.write().await;
        if let Some(parent) = parent_id {
            if !state.folders.iter().any(|f| &f.id == parent) {
                return Err(AppError::not_found("Parent folder not found"));
            }
        }
        let folder = Folder::new(FolderId::generate(), name, parent_id.cloned());
        state.folders.push(folder.clone());
        Ok(folder)
    }

    async fn rename_folder(&self, id: &FolderId, name: &str) -> AppResult<Folder> {
        self.enter("rename_folder", vec![id.to_string()])?;
        let mut state = self.state.write().await;
        let folder = state
            .folders
            .iter_mut()
            .find(|f| &f.id == id)
            .ok_or_else(|| AppError::not_found("Folder not found"))?;
        folder.name = name.to_string();
        Ok(folder.clone())
    }

    async fn delete_folder(&self, id: &FolderId) -> AppResult<()> {
        self.enter("delete_folder", vec![id.to_string()])?;
        let mut state = self.state.write().await;
        if !state.folders.iter().any(|f| &f.id == id) {
            return Err(AppError::not_found("Folder not found"));
        }
        let has_items = state.items.iter().any(|i| &i.folder_id == id);
        let has_children = state.folders.iter().any(|f| f.parent_id.as_ref() == Some(id));
        if has_items || has_children {
            return Err(AppError::conflict("Folder must be empty to delete"));
        }
        state.folders.retain(|f| &f.id != id);
        Ok(())
    }

    async fn list_items(&self, folder_id: Option<&FolderId>) -> AppResult<Vec<Item>> {
        self.enter("list_items", folder_id.map(|f| f.to_string()).into_iter().collect())?;
        let state = self.state.read().await;
        Ok(state
            .items
            .iter()
            .filter(|i| folder_id.is_none_or(|f| &i.folder_id == f))
            .cloned()
            .collect())
    }

    async fn upload_item(&self, upload: UploadItem) -> AppResult<Item> {
        self.enter("upload_item", vec![upload.folder_id.to_string()])?;
        let mut state = self.state.write().await;
        if !state.folders.iter().any(|f| f.id == upload.folder_id) {
            return Err(AppError::not_found("Folder not found"));
        }
        let mut item = Self::new_item(&upload.file, upload.folder_id, upload.thumbnail);
        item.add_tags(&upload.tags);
        state.content.insert(item.id.clone(), upload.file.data);
        state.items.push(item.clone());
        Ok(item)
    }

    async fn update_item(&self, id: &ItemId, patch: &ItemPatch) -> AppResult<Item> {
        self.enter("update_item", vec![id.to_string()])?;
        let mut state = self.state.write().await;
        let item = state
            .items
            .iter_mut()
            .find(|i| &i.id == id)
            .ok_or_else(|| AppError::not_found("Model not found"))?;
        patch.apply_to(item);
        Ok(item.clone())
    }

    async fn delete_item(&self, id: &ItemId) -> AppResult<()> {
        self.enter("delete_item", vec![id.to_string()])?;
        let mut state = self.state.write().await;
        let before = state.items.len();
        state.items.retain(|i| &i.id != id);
        if state.items.len() == before {
            return Err(AppError::not_found("Model not found"));
        }
        state.content.remove(id);
        Ok(())
    }

    async fn replace_item_content(
        &self,
        id: &ItemId,
        file: FileBlob,
        thumbnail: Option<String>,
    ) -> AppResult<Item> {
        self.enter("replace_item_content", vec![id.to_string()])?;
        let mut state = self.state.write().await;
        let item = state
            .items
            .iter_mut()
            .find(|i| &i.id == id)
            .ok_or_else(|| AppError::not_found("Model not found"))?;
        item.size = file.size();
        if thumbnail.is_some() {
            item.thumbnail = thumbnail;
        }
        let updated = item.clone();
        state.content.insert(id.clone(), file.data);
        Ok(updated)
    }

    async fn download_item(&self, id: &ItemId) -> AppResult<Bytes> {
        self.enter("download_item", vec![id.to_string()])?;
        self.state
            .read()
            .await
            .content
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::not_found("File not found"))
    }

    async fn bulk_delete_items(&self, ids: &[ItemId]) -> AppResult<()> {
        self.enter("bulk_delete_items", ids.iter().map(ToString::to_string).collect())?;
        let mut state = self.state.write().await;
        state.items.retain(|i| !ids.contains(&i.id));
        for id in ids {
            state.content.remove(id);
        }
        Ok(())
    }

    async fn bulk_move_items(&self, ids: &[ItemId], folder_id: &FolderId) -> AppResult<()> {
        self.enter("bulk_move_items", ids.iter().map(ToString::to_string).collect())?;
        let mut state = self.state.write().await;
        if !state.folders.iter().any(|f| &f.id == folder_id) {
            return Err(AppError::not_found("Target folder not found"));
        }
        for item in state.items.iter_mut().filter(|i| ids.contains(&i.id)) {
            item.folder_id = folder_id.clone();
        }
        Ok(())
    }

    async fn bulk_tag_items(&self, ids: &[ItemId], tags: &[String]) -> AppResult<()> {
        self.enter("bulk_tag_items", ids.iter().map(ToString::to_string).collect())?;
        let mut state = self.state.write().await;
        for item in state.items.iter_mut().filter(|i| ids.contains(&i.id)) {
            item.add_tags(tags);
        }
        Ok(())
    }

    async fn import_from_url(&self, url: &str, folder_id: &FolderId) -> AppResult<Item> {
        self.enter("import_from_url", vec![folder_id.to_string()])?;
        let mut state = self.state.write().await;
        if !state.folders.iter().any(|f| &f.id == folder_id) {
            return Err(AppError::not_found("Folder not found"));
        }
        // Minimal valid binary STL: 80-byte header plus a zero triangle count.
        let file = FileBlob::new(format!("{}.stl", name_from_url(url)), vec![0u8; 84]);
        let mut item = Self::new_item(&file, folder_id.clone(), None);
        item.description = format!("Imported from {url}");
        item.add_tags(&["imported".to_string(), "web".to_string()]);
        state.content.insert(item.id.clone(), file.data);
        state.items.push(item.clone());
        Ok(item)
    }

    async fn storage_usage(&self) -> AppResult<StorageUsage> {
        self.enter("storage_usage", Vec::new())?;
        let used = self.state.read().await.items.iter().map(|i| i.size).sum();
        Ok(StorageUsage::new(used, self.capacity))
    }
}
