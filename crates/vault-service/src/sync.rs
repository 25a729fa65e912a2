//! Optimistic local apply, remote confirmation, and failure reporting.
//!
//! Every mutation goes through [`SyncLayer::apply`]:
//!
//! 1. the change is applied to the local caches and an undo record kept;
//! 2. the remote store is called;
//! 3. on success, locally synthesized placeholders are swapped for the
//!    store's canonical objects;
//! 4. on failure, a [`Notice`] is broadcast and, when configured, the
//!    local change is reverted.
//!
//! The state lock is released before the remote call, so mutations may
//! overlap and complete in any order. The last response wins.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::broadcast;
use tracing::{debug, error, info};

use vault_core::config::sync::SyncConfig;
use vault_core::notice::Notice;
use vault_core::result::AppResult;
use vault_core::types::{FolderFilter, FolderId, ItemId};
use vault_entity::folder::Folder;
use vault_entity::item::{Dimensions, FileBlob, Item, ItemPatch, UploadItem};
use vault_remote::RemoteStore;

use crate::state::{LibraryState, SharedState};
use crate::tree::FolderTree;

/// A change to the library that must be confirmed by the remote store.
#[derive(Debug, Clone)]
pub enum Mutation {
    /// Create a folder.
    CreateFolder {
        /// Folder name.
        name: String,
        /// Parent folder (None for root level).
        parent_id: Option<FolderId>,
    },
    /// Rename a folder.
    RenameFolder {
        /// Folder to rename.
        id: FolderId,
        /// New name.
        name: String,
    },
    /// Delete an empty folder.
    DeleteFolder {
        /// Folder to delete.
        id: FolderId,
    },
    /// Store a new item.
    UploadItem(UploadItem),
    /// Patch an item's metadata.
    UpdateItem {
        /// Item to patch.
        id: ItemId,
        /// Fields to change.
        patch: ItemPatch,
    },
    /// Replace an item's binary content.
    ReplaceContent {
        /// Item to update.
        id: ItemId,
        /// New content.
        file: FileBlob,
        /// New thumbnail, if one was rendered.
        thumbnail: Option<String>,
    },
    /// Delete one item.
    DeleteItem {
        /// Item to delete.
        id: ItemId,
    },
    /// Move items into a folder with one call.
    BulkMove {
        /// Items to move.
        ids: Vec<ItemId>,
        /// Destination.
        folder_id: FolderId,
    },
    /// Union tags into items with one call.
    BulkTag {
        /// Items to tag.
        ids: Vec<ItemId>,
        /// Tags to add.
        tags: Vec<String>,
    },
    /// Delete items with one call.
    BulkDelete {
        /// Items to delete.
        ids: Vec<ItemId>,
    },
    /// Import a model from a public URL.
    ImportFromUrl {
        /// Source URL.
        url: String,
        /// Destination.
        folder_id: FolderId,
    },
}

impl Mutation {
    /// Short operation label used in logs and notices.
    pub fn label(&self) -> &'static str {
        match self {
            Self::CreateFolder { .. } => "create_folder",
            Self::RenameFolder { .. } => "rename_folder",
            Self::DeleteFolder { .. } => "delete_folder",
            Self::UploadItem(_) => "upload_item",
            Self::UpdateItem { .. } => "update_item",
            Self::ReplaceContent { .. } => "replace_item_content",
            Self::DeleteItem { .. } => "delete_item",
            Self::BulkMove { .. } => "bulk_move",
            Self::BulkTag { .. } => "bulk_tag",
            Self::BulkDelete { .. } => "bulk_delete",
            Self::ImportFromUrl { .. } => "import_from_url",
        }
    }

    /// User-safe message shown when the store rejects this mutation.
    fn failure_message(&self) -> String {
        match self {
            Self::CreateFolder { name, .. } => format!("Failed to create folder \"{name}\""),
            Self::RenameFolder { name, .. } => format!("Failed to rename folder to \"{name}\""),
            Self::DeleteFolder { .. } => "Failed to delete folder".to_string(),
            Self::UploadItem(upload) => format!("Failed to upload {}", upload.file.name),
            Self::UpdateItem { .. } => "Failed to update model".to_string(),
            Self::ReplaceContent { .. } => "Failed to replace file".to_string(),
            Self::DeleteItem { .. } => "Failed to delete model".to_string(),
            Self::BulkMove { ids, .. } => format!("Failed to move {}", plural(ids.len())),
            Self::BulkTag { ids, .. } => format!("Failed to tag {}", plural(ids.len())),
            Self::BulkDelete { ids } => format!("Failed to delete {}", plural(ids.len())),
            Self::ImportFromUrl { .. } => "Failed to import from URL".to_string(),
        }
    }
}

fn plural(count: usize) -> String {
    if count == 1 {
        "1 model".to_string()
    } else {
        format!("{count} models")
    }
}

/// What the store confirmed.
#[derive(Debug, Clone, PartialEq)]
pub enum Confirmed {
    /// The call succeeded with no object to reconcile.
    Done,
    /// The store's canonical folder.
    Folder(Folder),
    /// The store's canonical item.
    Item(Item),
}

/// Result of a synced mutation.
///
/// A remote failure is not an `Err`: it has already been reported as a
/// notice and the caller only needs to know it happened.
#[derive(Debug, Clone)]
pub enum SyncOutcome {
    /// The store accepted the change.
    Confirmed(Confirmed),
    /// The store rejected the change.
    Failed(Notice),
}

impl SyncOutcome {
    /// Whether the store accepted the change.
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed(_))
    }

    /// The failure notice, if any.
    pub fn notice(&self) -> Option<&Notice> {
        match self {
            Self::Failed(notice) => Some(notice),
            Self::Confirmed(_) => None,
        }
    }

    /// The confirmed folder, if the store returned one.
    pub fn folder(&self) -> Option<&Folder> {
        match self {
            Self::Confirmed(Confirmed::Folder(folder)) => Some(folder),
            _ => None,
        }
    }

    /// The confirmed item, if the store returned one.
    pub fn item(&self) -> Option<&Item> {
        match self {
            Self::Confirmed(Confirmed::Item(item)) => Some(item),
            _ => None,
        }
    }
}

/// How to take back an optimistic change.
#[derive(Debug)]
enum Undo {
    Nothing,
    /// Remove a placeholder folder.
    DropFolder(FolderId),
    /// Restore a folder's previous value.
    PutFolder(Folder),
    /// Re-add a deleted folder, reopening it if the delete navigated away.
    RestoreFolder {
        folder: Folder,
        reopen: bool,
    },
    /// Remove a placeholder item.
    DropItem(ItemId),
    /// Take back the field changes made to each item.
    RevertFields(Vec<(ItemId, FieldChanges)>),
    /// Reinsert deleted items at their former positions.
    ReinsertItems(Vec<(usize, Item)>),
}

impl Undo {
    /// Placeholders have no remote counterpart and are always dropped.
    fn is_placeholder(&self) -> bool {
        matches!(self, Self::DropFolder(_) | Self::DropItem(_))
    }
}

/// `(before, after)` values of the item fields one mutation changed.
///
/// Reverting touches only these fields, and a field is put back only while
/// it still holds the value this mutation wrote. Tags are tracked as the
/// exact set added and removed.
#[derive(Debug)]
struct FieldChanges {
    name: Option<(String, String)>,
    folder_id: Option<(FolderId, FolderId)>,
    size: Option<(u64, u64)>,
    description: Option<(String, String)>,
    thumbnail: Option<(Option<String>, Option<String>)>,
    dimensions: Option<(Option<Dimensions>, Option<Dimensions>)>,
    added_tags: Vec<String>,
    removed_tags: Vec<String>,
}

impl FieldChanges {
    fn between(before: &Item, after: &Item) -> Self {
        Self {
            name: changed(&before.name, &after.name),
            folder_id: changed(&before.folder_id, &after.folder_id),
            size: changed(&before.size, &after.size),
            description: changed(&before.description, &after.description),
            thumbnail: changed(&before.thumbnail, &after.thumbnail),
            dimensions: changed(&before.dimensions, &after.dimensions),
            added_tags: after.tags.difference(&before.tags).cloned().collect(),
            removed_tags: before.tags.difference(&after.tags).cloned().collect(),
        }
    }

    fn revert(&self, item: &mut Item) {
        restore(&mut item.name, &self.name);
        restore(&mut item.folder_id, &self.folder_id);
        restore(&mut item.size, &self.size);
        restore(&mut item.description, &self.description);
        restore(&mut item.thumbnail, &self.thumbnail);
        restore(&mut item.dimensions, &self.dimensions);
        for tag in &self.added_tags {
            item.tags.remove(tag);
        }
        item.tags.extend(self.removed_tags.iter().cloned());
    }
}

fn changed<T: Clone + PartialEq>(before: &T, after: &T) -> Option<(T, T)> {
    (before != after).then(|| (before.clone(), after.clone()))
}

fn restore<T: Clone + PartialEq>(field: &mut T, change: &Option<(T, T)>) {
    if let Some((before, after)) = change {
        if field == after {
            *field = before.clone();
        }
    }
}

/// Applies mutations optimistically and reconciles them with the store.
#[derive(Debug, Clone)]
pub struct SyncLayer {
    /// Source of truth.
    store: Arc<dyn RemoteStore>,
    /// Local caches.
    state: SharedState,
    /// Notice fan-out.
    notices: broadcast::Sender<Notice>,
    /// Whether to revert local changes the store rejected.
    rollback_on_failure: bool,
}

impl SyncLayer {
    /// Creates a new sync layer.
    pub fn new(store: Arc<dyn RemoteStore>, state: SharedState, config: &SyncConfig) -> Self {
        let (notices, _) = broadcast::channel(config.notice_buffer.max(1));
        Self {
            store,
            state,
            notices,
            rollback_on_failure: config.rollback_on_failure,
        }
    }

    /// Subscribe to user-facing notices.
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    /// Broadcast a notice. Dropped silently when nobody listens.
    pub fn notify(&self, notice: Notice) {
        let _ = self.notices.send(notice);
    }

    /// The remote store behind this layer.
    pub fn store(&self) -> &Arc<dyn RemoteStore> {
        &self.store
    }

    /// Apply a mutation locally, confirm it remotely, and reconcile.
    pub async fn apply(&self, mutation: Mutation) -> SyncOutcome {
        let operation = mutation.label();
        let undo = {
            let mut state = self.state.write();
            apply_local(&mut state, &mutation)
        };
        debug!(operation, "Applied mutation locally");

        let failure_message = mutation.failure_message();
        match self.call_remote(mutation).await {
            Ok(confirmed) => {
                {
                    let mut state = self.state.write();
                    reconcile(&mut state, &undo, &confirmed);
                }
                info!(operation, "Remote store confirmed mutation");
                SyncOutcome::Confirmed(confirmed)
            }
            Err(err) => {
                error!(operation, error = %err, "Remote mutation failed");
                let rolled_back = {
                    let mut state = self.state.write();
                    self.revert(&mut state, undo)
                };
                let notice = Notice::failure(operation, failure_message, rolled_back);
                self.notify(notice.clone());
                SyncOutcome::Failed(notice)
            }
        }
    }

    async fn call_remote(&self, mutation: Mutation) -> AppResult<Confirmed> {
        let store = &self.store;
        match mutation {
            Mutation::CreateFolder { name, parent_id } => store
                .create_folder(&name, parent_id.as_ref())
                .await
                .map(Confirmed::Folder),
            Mutation::RenameFolder { id, name } => {
                store.rename_folder(&id, &name).await.map(Confirmed::Folder)
            }
            Mutation::DeleteFolder { id } => {
                store.delete_folder(&id).await.map(|()| Confirmed::Done)
            }
            Mutation::UploadItem(upload) => store.upload_item(upload).await.map(Confirmed::Item),
            Mutation::UpdateItem { id, patch } => {
                store.update_item(&id, &patch).await.map(Confirmed::Item)
            }
            Mutation::ReplaceContent {
                id,
                file,
                thumbnail,
            } => store
                .replace_item_content(&id, file, thumbnail)
                .await
                .map(Confirmed::Item),
            Mutation::DeleteItem { id } => store.delete_item(&id).await.map(|()| Confirmed::Done),
            Mutation::BulkMove { ids, folder_id } => store
                .bulk_move_items(&ids, &folder_id)
                .await
                .map(|()| Confirmed::Done),
            Mutation::BulkTag { ids, tags } => store
                .bulk_tag_items(&ids, &tags)
                .await
                .map(|()| Confirmed::Done),
            Mutation::BulkDelete { ids } => store
                .bulk_delete_items(&ids)
                .await
                .map(|()| Confirmed::Done),
            Mutation::ImportFromUrl { url, folder_id } => store
                .import_from_url(&url, &folder_id)
                .await
                .map(Confirmed::Item),
        }
    }

    /// Undo a rejected change. Returns whether local state was rolled back.
    fn revert(&self, state: &mut LibraryState, undo: Undo) -> bool {
        if !self.rollback_on_failure && !undo.is_placeholder() {
            return false;
        }
        match undo {
            Undo::Nothing => return false,
            Undo::DropFolder(id) => {
                remove_folder(&mut state.tree, &id);
            }
            Undo::PutFolder(folder) => {
                let id = folder.id.clone();
                put_folder(&mut state.tree, folder, &id);
            }
            Undo::RestoreFolder { folder, reopen } => {
                let id = folder.id.clone();
                put_folder(&mut state.tree, folder, &id);
                // Only if nothing navigated elsewhere while the call was out.
                if reopen && state.navigation.is_all() {
                    state.navigate(FolderFilter::Folder(id));
                }
            }
            Undo::DropItem(id) => {
                state.items.remove(std::slice::from_ref(&id));
            }
            Undo::RevertFields(changes) => {
                for (id, change) in changes {
                    state
                        .items
                        .modify(std::slice::from_ref(&id), |item| change.revert(item));
                }
            }
            Undo::ReinsertItems(removed) => state.items.reinsert(removed),
        }
        self.rollback_on_failure
    }
}

/// Apply the optimistic part of a mutation and record how to undo it.
fn apply_local(state: &mut LibraryState, mutation: &Mutation) -> Undo {
    match mutation {
        Mutation::CreateFolder { name, parent_id } => {
            let placeholder = Folder::new(FolderId::placeholder(), name.clone(), parent_id.clone());
            let id = placeholder.id.clone();
            put_folder(&mut state.tree, placeholder, &id);
            Undo::DropFolder(id)
        }
        Mutation::RenameFolder { id, name } => match state.tree.get(id).cloned() {
            Some(previous) => {
                let renamed = Folder {
                    name: name.clone(),
                    ..previous.clone()
                };
                put_folder(&mut state.tree, renamed, id);
                Undo::PutFolder(previous)
            }
            None => Undo::Nothing,
        },
        Mutation::DeleteFolder { id } => match remove_folder(&mut state.tree, id) {
            Some(folder) => {
                let reopen = state.navigation.folder() == Some(id);
                if reopen {
                    state.navigate(FolderFilter::All);
                }
                Undo::RestoreFolder { folder, reopen }
            }
            None => Undo::Nothing,
        },
        Mutation::UploadItem(upload) => {
            let placeholder = Item {
                id: ItemId::placeholder(),
                name: upload.file.name.clone(),
                folder_id: upload.folder_id.clone(),
                size: upload.file.size(),
                date_added: Utc::now().timestamp_millis(),
                tags: upload.tags.iter().cloned().collect(),
                description: String::new(),
                thumbnail: upload.thumbnail.clone(),
                dimensions: None,
                url: None,
            };
            let id = placeholder.id.clone();
            state.items.prepend(placeholder);
            Undo::DropItem(id)
        }
        Mutation::UpdateItem { id, patch } => {
            change_items(state, std::slice::from_ref(id), |item| patch.apply_to(item))
        }
        Mutation::ReplaceContent {
            id,
            file,
            thumbnail,
        } => change_items(state, std::slice::from_ref(id), |item| {
            item.size = file.size();
            if let Some(thumbnail) = thumbnail {
                item.thumbnail = Some(thumbnail.clone());
            }
        }),
        Mutation::DeleteItem { id } => remove_items(state, std::slice::from_ref(id)),
        Mutation::BulkMove { ids, folder_id } => {
            change_items(state, ids, |item| item.folder_id = folder_id.clone())
        }
        Mutation::BulkTag { ids, tags } => change_items(state, ids, |item| {
            item.add_tags(tags);
        }),
        Mutation::BulkDelete { ids } => remove_items(state, ids),
        Mutation::ImportFromUrl { url, folder_id } => {
            let placeholder = Item {
                id: ItemId::placeholder(),
                name: import_display_name(url),
                folder_id: folder_id.clone(),
                size: 0,
                date_added: Utc::now().timestamp_millis(),
                tags: Default::default(),
                description: String::new(),
                thumbnail: None,
                dimensions: None,
                url: None,
            };
            let id = placeholder.id.clone();
            state.items.prepend(placeholder);
            Undo::DropItem(id)
        }
    }
}

fn change_items(state: &mut LibraryState, ids: &[ItemId], f: impl Fn(&mut Item)) -> Undo {
    Undo::RevertFields(state.items.modify(ids, |item| {
        let before = item.clone();
        f(item);
        (item.id.clone(), FieldChanges::between(&before, item))
    }))
}

fn remove_items(state: &mut LibraryState, ids: &[ItemId]) -> Undo {
    let removed = state.items.remove(ids);
    state.selection.forget(ids);
    if state.open_item.as_ref().is_some_and(|open| ids.contains(open)) {
        state.open_item = None;
    }
    Undo::ReinsertItems(removed)
}

/// Swap placeholders for canonical objects and adopt the store's answer.
fn reconcile(state: &mut LibraryState, undo: &Undo, confirmed: &Confirmed) {
    match (undo, confirmed) {
        (Undo::DropFolder(placeholder), Confirmed::Folder(folder)) => {
            put_folder(&mut state.tree, folder.clone(), placeholder);
            if state.navigation.folder() == Some(placeholder) {
                state.navigation = FolderFilter::Folder(folder.id.clone());
            }
        }
        (_, Confirmed::Folder(folder)) => {
            if state.tree.contains(&folder.id) {
                put_folder(&mut state.tree, folder.clone(), &folder.id);
            }
        }
        (Undo::DropItem(placeholder), Confirmed::Item(item)) => {
            if !state.items.swap(placeholder, item.clone()) {
                state.items.prepend(item.clone());
            }
            if state.open_item.as_ref() == Some(placeholder) {
                state.open_item = Some(item.id.clone());
            }
        }
        (_, Confirmed::Item(item)) => {
            state.items.swap(&item.id, item.clone());
        }
        (_, Confirmed::Done) => {}
    }
}

/// Replace the folder stored under `slot_id` with `folder`, or add it.
fn put_folder(tree: &mut FolderTree, folder: Folder, slot_id: &FolderId) {
    let mut folders = tree.folders().to_vec();
    match folders.iter_mut().find(|f| &f.id == slot_id) {
        Some(slot) => *slot = folder,
        None => folders.push(folder),
    }
    tree.replace(folders);
}

fn remove_folder(tree: &mut FolderTree, id: &FolderId) -> Option<Folder> {
    let mut folders = tree.folders().to_vec();
    let position = folders.iter().position(|f| &f.id == id)?;
    let removed = folders.remove(position);
    tree.replace(folders);
    Some(removed)
}

/// Name shown for an import until the store answers.
fn import_display_name(url: &str) -> String {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty() && !segment.contains(':'))
        .unwrap_or("Imported model")
        .to_string()
}
