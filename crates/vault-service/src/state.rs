//! Library state: the single owner of every client-side cache.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use vault_core::types::{FolderFilter, FolderId, ItemId};
use vault_entity::folder::Folder;
use vault_entity::item::Item;
use vault_entity::storage::StorageUsage;

use crate::drag::DragResolver;
use crate::items::ItemIndex;
use crate::selection::Selection;
use crate::tree::FolderTree;
use crate::upload::PendingUpload;

/// A destructive action awaiting explicit confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingDelete {
    /// Several items, deleted with one bulk call.
    Items {
        /// Items to delete.
        ids: Vec<ItemId>,
        /// Whether the ids came from the selection.
        from_selection: bool,
    },
    /// One item, deleted from the detail view.
    Item(ItemId),
    /// One (empty) folder.
    Folder(FolderId),
}

/// Everything the client knows, behind one lock.
#[derive(Debug, Default)]
pub struct LibraryState {
    /// Folder hierarchy.
    pub tree: FolderTree,
    /// Leaf items.
    pub items: ItemIndex,
    /// Active folder filter.
    pub navigation: FolderFilter,
    /// Items chosen for bulk actions.
    pub selection: Selection,
    /// Item shown in the detail view.
    pub open_item: Option<ItemId>,
    /// Delete awaiting confirmation.
    pub pending_delete: Option<PendingDelete>,
    /// Upload awaiting a destination.
    pub pending_upload: Option<PendingUpload>,
    /// Drag hover state.
    pub drag: DragResolver,
    /// Last known storage usage.
    pub usage: StorageUsage,
    /// Files queued or uploading right now.
    pub uploads_in_flight: usize,
}

impl LibraryState {
    /// Change the folder filter. Always clears the selection.
    pub fn navigate(&mut self, filter: FolderFilter) {
        self.navigation = filter;
        self.selection.clear();
    }

    /// Items visible under the current filter.
    pub fn visible_items(&self) -> Vec<&Item> {
        self.items.filtered(&self.navigation)
    }

    /// Ids of the visible items.
    pub fn visible_item_ids(&self) -> Vec<ItemId> {
        self.visible_items().iter().map(|item| item.id.clone()).collect()
    }

    /// Direct subfolders of the active folder. Empty at the library root,
    /// where the tree itself lists the top level.
    pub fn visible_subfolders(&self) -> Vec<&Folder> {
        match &self.navigation {
            FolderFilter::All => Vec::new(),
            FolderFilter::Folder(id) => self.tree.children_of(Some(id)),
        }
    }

    /// Whether `id` names a confirmed folder that can receive items.
    pub fn is_valid_destination(&self, id: &FolderId) -> bool {
        self.tree.get(id).is_some_and(|folder| !folder.is_pending())
    }

    /// Number of direct children plus directly contained items.
    pub fn folder_occupancy(&self, id: &FolderId) -> (usize, usize) {
        (self.tree.count_direct_children(id), self.items.count_in(id))
    }
}

/// Cloneable handle to the state lock.
///
/// The lock is synchronous and never held across an await point; every
/// accessor returns a guard meant to be dropped before the next suspension.
#[derive(Debug, Clone, Default)]
pub struct SharedState(Arc<RwLock<LibraryState>>);

impl SharedState {
    /// Wrap a state value.
    pub fn new(state: LibraryState) -> Self {
        Self(Arc::new(RwLock::new(state)))
    }

    /// Acquire a read guard.
    pub fn read(&self) -> RwLockReadGuard<'_, LibraryState> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Acquire a write guard.
    pub fn write(&self) -> RwLockWriteGuard<'_, LibraryState> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }
}
