//! Flat index of leaf items, keyed by the folder they belong to.

use std::collections::HashMap;

use vault_core::types::{FolderFilter, FolderId, ItemId};
use vault_entity::item::Item;

/// Flat collection of items, newest first.
#[derive(Debug, Clone, Default)]
pub struct ItemIndex {
    items: Vec<Item>,
}

impl ItemIndex {
    /// Build an index from a store listing.
    pub fn new(mut items: Vec<Item>) -> Self {
        newest_first(&mut items);
        Self { items }
    }

    /// Swap the backing collection.
    pub fn replace(&mut self, mut items: Vec<Item>) {
        newest_first(&mut items);
        self.items = items;
    }

    /// All items.
    pub fn all(&self) -> &[Item] {
        &self.items
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up an item by id.
    pub fn get(&self, id: &ItemId) -> Option<&Item> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Items visible under a navigation filter.
    pub fn filtered<'a>(&'a self, filter: &'a FolderFilter) -> Vec<&'a Item> {
        match filter {
            FolderFilter::All => self.items.iter().collect(),
            FolderFilter::Folder(folder) => self.in_folder(folder).collect(),
        }
    }

    /// Items directly inside `folder`.
    pub fn in_folder<'a>(&'a self, folder: &'a FolderId) -> impl Iterator<Item = &'a Item> + 'a {
        self.items.iter().filter(move |item| &item.folder_id == folder)
    }

    /// Number of items directly inside `folder`.
    pub fn count_in(&self, folder: &FolderId) -> usize {
        self.in_folder(folder).count()
    }

    /// Direct item count for every folder that holds at least one item.
    pub fn counts_by_folder(&self) -> HashMap<FolderId, usize> {
        let mut counts = HashMap::new();
        for item in &self.items {
            *counts.entry(item.folder_id.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Insert a new item at the front.
    pub fn prepend(&mut self, item: Item) {
        self.items.insert(0, item);
    }

    /// Replace the item stored under `old_id` (typically a placeholder) with
    /// `item`, keeping its position. Returns `false` when `old_id` is gone.
    pub fn swap(&mut self, old_id: &ItemId, item: Item) -> bool {
        match self.items.iter_mut().find(|existing| &existing.id == old_id) {
            Some(existing) => {
                *existing = item;
                true
            }
            None => false,
        }
    }

    /// Apply `f` to every known item in `ids`, collecting what it returns.
    /// Unknown ids are skipped.
    pub fn modify<R>(&mut self, ids: &[ItemId], mut f: impl FnMut(&mut Item) -> R) -> Vec<R> {
        self.items
            .iter_mut()
            .filter(|item| ids.contains(&item.id))
            .map(|item| f(item))
            .collect()
    }

    /// Remove every known item in `ids`, returning each with its former
    /// position so it can be reinserted.
    pub fn remove(&mut self, ids: &[ItemId]) -> Vec<(usize, Item)> {
        let mut removed = Vec::new();
        let mut slot = 0;
        let mut position = 0;
        while slot < self.items.len() {
            if ids.contains(&self.items[slot].id) {
                removed.push((position, self.items.remove(slot)));
            } else {
                slot += 1;
            }
            position += 1;
        }
        removed
    }

    /// Reinsert items previously returned by [`ItemIndex::remove`].
    pub fn reinsert(&mut self, removed: Vec<(usize, Item)>) {
        for (position, item) in removed {
            let at = position.min(self.items.len());
            self.items.insert(at, item);
        }
    }
}

/// Stable sort by `date_added`, descending.
fn newest_first(items: &mut [Item]) {
    items.sort_by_key(|item| std::cmp::Reverse(item.date_added));
}
