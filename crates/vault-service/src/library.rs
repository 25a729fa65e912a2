//! The library: one state owner, handed around as a cheap clone.
//!
//! `Library` owns the folder tree, the item index, navigation, selection,
//! the detail view, pending confirmations, drag state, storage usage and
//! the upload counter. Reads return owned snapshots; every mutation goes
//! through the sync layer. Clones share state, so operations can be
//! spawned onto the runtime and run concurrently.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use vault_core::config::AppConfig;
use vault_core::error::AppError;
use vault_core::notice::Notice;
use vault_core::result::AppResult;
use vault_core::types::{FolderFilter, FolderId, ItemId};
use vault_entity::drag::DragPayload;
use vault_entity::folder::{Folder, FolderNode};
use vault_entity::item::{Dimensions, FileBlob, Item, ItemPatch, UploadItem};
use vault_entity::storage::StorageUsage;
use vault_remote::RemoteStore;

use crate::archive::DownloadArchive;
use crate::bulk::{BulkCoordinator, BulkTarget};
use crate::drag::{self, DragData, DropAction, DropZone};
use crate::items::ItemIndex;
use crate::query::ItemQuery;
use crate::state::{LibraryState, PendingDelete, SharedState};
use crate::sync::{Mutation, SyncLayer, SyncOutcome};
use crate::tree::FolderTree;
use crate::upload::{
    MetadataGenerator, PendingUpload, ThumbnailRenderer, UploadReport, is_renderable,
    parse_tag_list,
};

/// Result of handing files to the library.
#[derive(Debug, Clone)]
pub enum UploadOutcome {
    /// Files were uploaded (some may have failed).
    Uploaded(UploadReport),
    /// No destination was implied; a pending upload awaits confirmation.
    AwaitingDestination(PendingUpload),
}

/// Result of a drop gesture.
#[derive(Debug, Clone)]
pub enum DropResult {
    /// Files were uploaded into a folder.
    Uploaded(UploadReport),
    /// Files await a destination.
    AwaitingDestination(PendingUpload),
    /// Items were moved.
    Moved(SyncOutcome),
    /// Nothing happened.
    Ignored,
}

/// Client-side model of a ModelVault collection.
#[derive(Clone)]
pub struct Library {
    /// Shared caches.
    state: SharedState,
    /// Mutation pipeline.
    sync: SyncLayer,
    /// Bulk operations.
    bulk: BulkCoordinator,
    /// Optional thumbnail collaborator.
    renderer: Option<Arc<dyn ThumbnailRenderer>>,
    /// Optional metadata collaborator.
    metadata: Option<Arc<dyn MetadataGenerator>>,
}

impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library")
            .field("store", &self.sync.store().provider_type())
            .finish()
    }
}

impl Library {
    /// Create an empty library over `store`. Call [`Library::load`] next.
    pub fn new(store: Arc<dyn RemoteStore>, config: &AppConfig) -> Self {
        let state = SharedState::new(LibraryState::default());
        let sync = SyncLayer::new(store, state.clone(), &config.sync);
        let bulk = BulkCoordinator::new(sync.clone(), state.clone(), config.download.clone());
        Self {
            state,
            sync,
            bulk,
            renderer: None,
            metadata: None,
        }
    }

    /// Attach a thumbnail renderer.
    pub fn with_renderer(mut self, renderer: Arc<dyn ThumbnailRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Attach a metadata generator.
    pub fn with_metadata_generator(mut self, generator: Arc<dyn MetadataGenerator>) -> Self {
        self.metadata = Some(generator);
        self
    }

    /// Subscribe to user-facing notices.
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.sync.subscribe()
    }

    /// The bulk coordinator.
    pub fn bulk(&self) -> &BulkCoordinator {
        &self.bulk
    }

    /// Run `f` against a read snapshot of the state.
    pub fn with_state<R>(&self, f: impl FnOnce(&LibraryState) -> R) -> R {
        let state = self.state.read();
        f(&state)
    }

    // ── Loading ──────────────────────────────────────────────────────

    /// Fetch folders, items and usage from the store, replacing every cache.
    pub async fn load(&self) -> AppResult<()> {
        let store = self.sync.store();
        let folders = store.list_folders().await?;
        let items = store.list_items(None).await?;
        let usage = store.storage_usage().await?;

        let tree = FolderTree::new(folders);
        if let Err(err) = tree.validate() {
            warn!(error = %err, "Folder hierarchy from store is inconsistent");
        }

        let mut state = self.state.write();
        info!(
            folders = tree.len(),
            items = items.len(),
            used = usage.used,
            "Library loaded"
        );
        state.tree = tree;
        state.items = ItemIndex::new(items);
        state.usage = usage;
        if let Some(folder) = state.navigation.folder().cloned() {
            if !state.tree.contains(&folder) {
                state.navigate(FolderFilter::All);
            }
        }
        Ok(())
    }

    /// Refresh storage usage from the store.
    pub async fn refresh_usage(&self) -> AppResult<StorageUsage> {
        let usage = self.sync.store().storage_usage().await?;
        self.state.write().usage = usage;
        Ok(usage)
    }

    async fn refresh_usage_quietly(&self) {
        if let Err(err) = self.refresh_usage().await {
            warn!(error = %err, "Failed to refresh storage usage");
        }
    }

    // ── Snapshots ────────────────────────────────────────────────────

    /// Last known storage usage.
    pub fn usage(&self) -> StorageUsage {
        self.state.read().usage
    }

    /// Active folder filter.
    pub fn navigation(&self) -> FolderFilter {
        self.state.read().navigation.clone()
    }

    /// Every folder, in store order.
    pub fn folders(&self) -> Vec<Folder> {
        self.state.read().tree.folders().to_vec()
    }

    /// One folder.
    pub fn folder(&self, id: &FolderId) -> Option<Folder> {
        self.state.read().tree.get(id).cloned()
    }

    /// Every item, newest first.
    pub fn items(&self) -> Vec<Item> {
        self.state.read().items.all().to_vec()
    }

    /// One item.
    pub fn item(&self, id: &ItemId) -> Option<Item> {
        self.state.read().items.get(id).cloned()
    }

    /// Items visible under the current filter.
    pub fn visible_items(&self) -> Vec<Item> {
        self.state.read().visible_items().into_iter().cloned().collect()
    }

    /// Visible items matching `query`, in its order.
    pub fn visible_items_with(&self, query: &ItemQuery) -> Vec<Item> {
        let state = self.state.read();
        query
            .apply(state.visible_items())
            .into_iter()
            .cloned()
            .collect()
    }

    /// Subfolders of the active folder whose names match `query`, by name.
    pub fn visible_subfolders_with(&self, query: &ItemQuery) -> Vec<Folder> {
        let state = self.state.read();
        query
            .apply_folders(state.visible_subfolders())
            .into_iter()
            .cloned()
            .collect()
    }

    /// Subfolders of the active folder.
    pub fn visible_subfolders(&self) -> Vec<Folder> {
        self.state
            .read()
            .visible_subfolders()
            .into_iter()
            .cloned()
            .collect()
    }

    /// Breadcrumbs from the root to the active folder.
    pub fn breadcrumbs(&self) -> Vec<Folder> {
        let state = self.state.read();
        match state.navigation.folder() {
            Some(id) => state.tree.path_to_root(id).into_iter().cloned().collect(),
            None => Vec::new(),
        }
    }

    /// Nested folder view with item counts.
    pub fn folder_tree(&self) -> Vec<FolderNode> {
        let state = self.state.read();
        state.tree.build_nodes(&state.items.counts_by_folder())
    }

    /// Folders to expand so `id` is visible in the tree.
    pub fn expansion_path(&self, id: &FolderId) -> Vec<FolderId> {
        self.state.read().tree.expansion_path(id)
    }

    /// Files uploading right now.
    pub fn uploads_in_flight(&self) -> usize {
        self.state.read().uploads_in_flight
    }

    // ── Navigation & detail view ─────────────────────────────────────

    /// Change the folder filter, clearing the selection.
    pub fn navigate(&self, filter: FolderFilter) -> AppResult<()> {
        let mut state = self.state.write();
        if let FolderFilter::Folder(id) = &filter {
            if !state.tree.contains(id) {
                return Err(AppError::not_found(format!("Folder '{id}' not found")));
            }
        }
        debug!(navigation = %filter, "Navigating");
        state.navigate(filter);
        Ok(())
    }

    /// Show an item in the detail view.
    pub fn open_item(&self, id: &ItemId) -> AppResult<Item> {
        let mut state = self.state.write();
        let item = state
            .items
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Model '{id}' not found")))?;
        state.open_item = Some(id.clone());
        Ok(item)
    }

    /// Close the detail view.
    pub fn close_item(&self) {
        self.state.write().open_item = None;
    }

    /// The item in the detail view, if it still exists.
    pub fn opened_item(&self) -> Option<Item> {
        let state = self.state.read();
        state.open_item.as_ref().and_then(|id| state.items.get(id)).cloned()
    }

    // ── Selection ────────────────────────────────────────────────────

    /// Toggle one item. Returns whether it is now selected.
    pub fn toggle_selection(&self, id: &ItemId) -> bool {
        self.state.write().selection.toggle(id)
    }

    /// Select every visible item, or clear if they are all selected.
    pub fn select_all(&self) {
        let mut state = self.state.write();
        let visible = state.visible_item_ids();
        state.selection.select_all(&visible);
    }

    /// Clear the selection.
    pub fn clear_selection(&self) {
        self.state.write().selection.clear();
    }

    /// Selected ids.
    pub fn selection(&self) -> Vec<ItemId> {
        self.state.read().selection.ids()
    }

    // ── Drag & drop ──────────────────────────────────────────────────

    /// Start dragging an item (with the selection, if it is selected).
    pub fn begin_item_drag(&self, id: &ItemId) -> DragData {
        drag::begin_item_drag(id, &self.state.read().selection)
    }

    /// A drag entered (or moved over) `zone`.
    pub fn drag_enter(&self, zone: &DropZone, data: &DragData) -> Option<DragPayload> {
        self.state.write().drag.enter(zone, data)
    }

    /// A drag left `zone` for `related`.
    pub fn drag_leave(&self, zone: &DropZone, related: Option<&DropZone>) {
        self.state.write().drag.leave(zone, related);
    }

    /// The folder currently highlighted as drop target.
    pub fn drop_target(&self) -> Option<FolderId> {
        self.state.read().drag.target().cloned()
    }

    /// Whether the canvas upload overlay is showing.
    pub fn canvas_active(&self) -> bool {
        self.state.read().drag.canvas_active()
    }

    /// Handle a drop on `zone`.
    ///
    /// A move whose ids are exactly the selection consumes the selection;
    /// any other move leaves it alone. Dropping items on the folder that
    /// already holds all of them does nothing.
    pub async fn drop(&self, zone: &DropZone, data: &DragData) -> AppResult<DropResult> {
        let (action, target) = {
            let mut state = self.state.write();
            let navigation = state.navigation.clone();
            let action = state.drag.drop(zone, data, &navigation);
            let target = match &action {
                DropAction::Move {
                    item_ids,
                    folder_id,
                } => {
                    let already_there = item_ids.iter().all(|id| {
                        state
                            .items
                            .get(id)
                            .is_some_and(|item| &item.folder_id == folder_id)
                    });
                    if already_there {
                        debug!(folder_id = %folder_id, "Items already in drop target");
                        return Ok(DropResult::Ignored);
                    }
                    if state.selection.matches(item_ids) {
                        Some(BulkTarget::Selection)
                    } else {
                        Some(BulkTarget::Explicit(item_ids.clone()))
                    }
                }
                _ => None,
            };
            (action, target)
        };

        match (action, target) {
            (DropAction::Upload { files, folder_id }, _) => Ok(DropResult::Uploaded(
                self.upload_into(files, folder_id, Vec::new()).await?,
            )),
            (DropAction::ChooseDestination { files }, _) => {
                Ok(DropResult::AwaitingDestination(self.stage_upload(files)))
            }
            (DropAction::Move { folder_id, .. }, Some(target)) => {
                Ok(DropResult::Moved(self.bulk.move_items(target, folder_id).await?))
            }
            _ => Ok(DropResult::Ignored),
        }
    }

    // ── Folders ──────────────────────────────────────────────────────

    /// Create a folder under `parent_id` (root level for `None`).
    pub async fn create_folder(
        &self,
        name: &str,
        parent_id: Option<FolderId>,
    ) -> AppResult<SyncOutcome> {
        let name = required_name(name, "Folder name")?;
        if let Some(parent) = &parent_id {
            if !self.state.read().is_valid_destination(parent) {
                return Err(AppError::validation(format!(
                    "Unknown parent folder '{parent}'"
                )));
            }
        }
        info!(name = %name, parent_id = ?parent_id.as_ref().map(FolderId::as_str), "Creating folder");
        Ok(self.sync.apply(Mutation::CreateFolder { name, parent_id }).await)
    }

    /// Rename a folder.
    pub async fn rename_folder(&self, id: &FolderId, name: &str) -> AppResult<SyncOutcome> {
        let name = required_name(name, "Folder name")?;
        if !self.state.read().is_valid_destination(id) {
            return Err(AppError::not_found(format!("Folder '{id}' not found")));
        }
        Ok(self
            .sync
            .apply(Mutation::RenameFolder {
                id: id.clone(),
                name,
            })
            .await)
    }

    /// Ask to delete a folder. Refused while it has items or subfolders.
    pub fn request_folder_delete(&self, id: &FolderId) -> AppResult<PendingDelete> {
        self.bulk.request_folder_delete(id.clone())
    }

    // ── Uploads ──────────────────────────────────────────────────────

    /// Upload files into `folder`, or into the active folder when `None`.
    ///
    /// At the library root with no folder given, the files are staged as a
    /// pending upload awaiting [`Library::confirm_upload`].
    pub async fn upload_files(
        &self,
        files: Vec<FileBlob>,
        folder: Option<FolderId>,
    ) -> AppResult<UploadOutcome> {
        if files.is_empty() {
            return Err(AppError::validation("No files to upload"));
        }
        let destination = folder.or_else(|| self.state.read().navigation.folder().cloned());
        match destination {
            Some(folder_id) => Ok(UploadOutcome::Uploaded(
                self.upload_into(files, folder_id, Vec::new()).await?,
            )),
            None => Ok(UploadOutcome::AwaitingDestination(self.stage_upload(files))),
        }
    }

    fn stage_upload(&self, files: Vec<FileBlob>) -> PendingUpload {
        let mut state = self.state.write();
        let suggested = state
            .tree
            .children_of(None)
            .first()
            .map(|folder| folder.id.clone());
        let pending = PendingUpload::new(files, suggested);
        debug!(files = pending.files.len(), "Upload awaiting destination");
        state.pending_upload = Some(pending.clone());
        pending
    }

    /// The upload awaiting a destination, if any.
    pub fn pending_upload(&self) -> Option<PendingUpload> {
        self.state.read().pending_upload.clone()
    }

    /// Set the tags of the pending upload from comma-separated input.
    pub fn set_pending_upload_tags(&self, input: &str) -> AppResult<()> {
        let mut state = self.state.write();
        let pending = state
            .pending_upload
            .as_mut()
            .ok_or_else(|| AppError::validation("No upload is awaiting a destination"))?;
        pending.tags = parse_tag_list(input);
        Ok(())
    }

    /// Upload the pending files into `folder_id`.
    ///
    /// An unknown destination is a validation error and leaves the pending
    /// upload in place.
    pub async fn confirm_upload(&self, folder_id: &FolderId) -> AppResult<UploadReport> {
        let pending = {
            let mut state = self.state.write();
            let Some(pending) = state.pending_upload.take() else {
                return Err(AppError::validation("No upload is awaiting a destination"));
            };
            if !state.is_valid_destination(folder_id) {
                state.pending_upload = Some(pending);
                return Err(AppError::validation("Choose a destination folder"));
            }
            if let Err(err) = check_capacity(&state.usage, pending.total_size()) {
                state.pending_upload = Some(pending);
                return Err(err);
            }
            pending
        };
        self.upload_into(pending.files, folder_id.clone(), pending.tags)
            .await
    }

    /// Discard the pending upload.
    pub fn cancel_upload(&self) -> Option<PendingUpload> {
        self.state.write().pending_upload.take()
    }

    /// Upload files one at a time, each synced on its own.
    async fn upload_into(
        &self,
        files: Vec<FileBlob>,
        folder_id: FolderId,
        tags: Vec<String>,
    ) -> AppResult<UploadReport> {
        {
            let mut state = self.state.write();
            if !state.is_valid_destination(&folder_id) {
                return Err(AppError::validation(format!(
                    "Unknown destination folder '{folder_id}'"
                )));
            }
            check_capacity(&state.usage, files.iter().map(FileBlob::size).sum())?;
            state.uploads_in_flight += files.len();
        }
        info!(files = files.len(), folder_id = %folder_id, "Uploading files");

        let mut report = UploadReport::default();
        for file in files {
            let name = file.name.clone();
            let thumbnail = self.render_thumbnail(&file).await;
            let outcome = self
                .sync
                .apply(Mutation::UploadItem(UploadItem {
                    file,
                    folder_id: folder_id.clone(),
                    thumbnail,
                    tags: tags.clone(),
                }))
                .await;
            {
                let mut state = self.state.write();
                state.uploads_in_flight = state.uploads_in_flight.saturating_sub(1);
            }
            match outcome.item() {
                Some(item) => report.uploaded.push(item.clone()),
                None => report.failed.push(name),
            }
        }

        self.refresh_usage_quietly().await;
        Ok(report)
    }

    async fn render_thumbnail(&self, file: &FileBlob) -> Option<String> {
        let renderer = self.renderer.as_ref()?;
        if !is_renderable(&file.name) {
            return None;
        }
        match renderer.render(file).await {
            Ok(thumbnail) => thumbnail,
            Err(err) => {
                warn!(file = %file.name, error = %err, "Thumbnail generation failed, uploading without thumbnail");
                None
            }
        }
    }

    /// Import a model from a public URL into `folder_id`.
    pub async fn import_from_url(&self, url: &str, folder_id: &FolderId) -> AppResult<SyncOutcome> {
        let url = url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(AppError::validation("Enter a valid http(s) URL"));
        }
        if !self.state.read().is_valid_destination(folder_id) {
            return Err(AppError::validation("Choose a destination folder"));
        }
        info!(url, folder_id = %folder_id, "Importing model from URL");
        let outcome = self
            .sync
            .apply(Mutation::ImportFromUrl {
                url: url.to_string(),
                folder_id: folder_id.clone(),
            })
            .await;
        if outcome.is_confirmed() {
            self.refresh_usage_quietly().await;
        }
        Ok(outcome)
    }

    // ── Items ────────────────────────────────────────────────────────

    /// Apply a partial update to an item.
    pub async fn update_item(&self, id: &ItemId, patch: ItemPatch) -> AppResult<SyncOutcome> {
        if patch.is_empty() {
            return Err(AppError::validation("Nothing to update"));
        }
        if let Some(name) = &patch.name {
            required_name(name, "Model name")?;
        }
        self.require_item(id)?;
        debug!(item_id = %id, fields = ?patch.changed_fields(), "Updating model");
        Ok(self
            .sync
            .apply(Mutation::UpdateItem {
                id: id.clone(),
                patch,
            })
            .await)
    }

    /// Replace an item's content with a file of the same type.
    pub async fn replace_item_content(&self, id: &ItemId, file: FileBlob) -> AppResult<SyncOutcome> {
        let current = self.require_item(id)?;
        if let (Some(current_ext), Some(new_ext)) = (current.extension(), file.extension()) {
            if current_ext != new_ext {
                return Err(AppError::validation(format!(
                    "You cannot replace a .{current_ext} file with a .{new_ext} file."
                )));
            }
        }
        let thumbnail = self.render_thumbnail(&file).await;
        info!(item_id = %id, size = file.size(), "Replacing model content");
        let outcome = self
            .sync
            .apply(Mutation::ReplaceContent {
                id: id.clone(),
                file,
                thumbnail,
            })
            .await;
        if outcome.is_confirmed() {
            self.refresh_usage_quietly().await;
        }
        Ok(outcome)
    }

    /// Record measured dimensions for an item that has none yet.
    pub async fn record_dimensions(
        &self,
        id: &ItemId,
        dimensions: Dimensions,
    ) -> AppResult<Option<SyncOutcome>> {
        if self.require_item(id)?.dimensions.is_some() {
            return Ok(None);
        }
        let patch = ItemPatch {
            dimensions: Some(dimensions),
            ..ItemPatch::default()
        };
        self.update_item(id, patch).await.map(Some)
    }

    /// Ask the metadata collaborator for tags and a description, and apply
    /// them as an ordinary update (tags are unioned).
    pub async fn suggest_metadata(&self, id: &ItemId) -> AppResult<SyncOutcome> {
        let generator = self
            .metadata
            .clone()
            .ok_or_else(|| AppError::not_implemented("No metadata generator configured"))?;
        let item = self.require_item(id)?;
        let suggestion = generator.suggest(&item.name, &item.description).await?;

        let mut tags = item.tags.clone();
        tags.extend(parse_tag_list(&suggestion.tags.join(",")));
        let description = suggestion.description.trim();
        let patch = ItemPatch {
            tags: Some(tags),
            description: (!description.is_empty()).then(|| description.to_string()),
            ..ItemPatch::default()
        };
        self.update_item(id, patch).await
    }

    /// Ask to delete one item.
    pub fn request_item_delete(&self, id: &ItemId) -> AppResult<PendingDelete> {
        self.bulk.request_item_delete(id.clone())
    }

    fn require_item(&self, id: &ItemId) -> AppResult<Item> {
        self.item(id)
            .ok_or_else(|| AppError::not_found(format!("Model '{id}' not found")))
    }

    // ── Bulk ─────────────────────────────────────────────────────────

    /// Move the selection into `folder_id`.
    pub async fn move_selection(&self, folder_id: &FolderId) -> AppResult<SyncOutcome> {
        self.bulk.move_items(BulkTarget::Selection, folder_id.clone()).await
    }

    /// Add tags (comma-separated input) to every selected item.
    pub async fn tag_selection(&self, input: &str) -> AppResult<SyncOutcome> {
        self.bulk
            .tag_items(BulkTarget::Selection, &parse_tag_list(input))
            .await
    }

    /// Ask to delete the selection.
    pub fn request_selection_delete(&self) -> AppResult<PendingDelete> {
        self.bulk.request_delete(BulkTarget::Selection)
    }

    /// The delete awaiting confirmation, if any.
    pub fn pending_delete(&self) -> Option<PendingDelete> {
        self.bulk.pending_delete()
    }

    /// Execute the pending delete.
    pub async fn confirm_delete(&self) -> AppResult<SyncOutcome> {
        let outcome = self.bulk.confirm_delete().await?;
        if outcome.is_confirmed() {
            self.refresh_usage_quietly().await;
        }
        Ok(outcome)
    }

    /// Drop the pending delete.
    pub fn cancel_delete(&self) -> Option<PendingDelete> {
        self.bulk.cancel_delete()
    }

    /// Package the selection into one zip archive.
    pub async fn download_selection(&self) -> AppResult<DownloadArchive> {
        self.bulk.download(BulkTarget::Selection).await
    }
}

/// Refuse uploads the last known usage says cannot fit.
fn check_capacity(usage: &StorageUsage, bytes: u64) -> AppResult<()> {
    if usage.would_exceed(bytes) {
        return Err(AppError::validation(format!(
            "Not enough storage space: {bytes} bytes requested, {} bytes free",
            usage.free()
        )));
    }
    Ok(())
}

fn required_name(name: &str, what: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation(format!("{what} cannot be empty")));
    }
    Ok(name.to_string())
}
