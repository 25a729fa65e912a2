//! Multi-item selection.

use std::collections::BTreeSet;

use vault_core::types::ItemId;

/// The set of items chosen for a bulk action.
///
/// Scoped to the current navigation context: the library clears it
/// whenever the folder filter changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<ItemId>,
}

impl Selection {
    /// Create an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `id` if absent, remove it if present. Returns whether it is now
    /// selected.
    pub fn toggle(&mut self, id: &ItemId) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.clone());
            true
        }
    }

    /// Select every visible item, or clear when the selection already
    /// equals the visible set.
    pub fn select_all<'a>(&mut self, visible: impl IntoIterator<Item = &'a ItemId>) {
        let visible: BTreeSet<ItemId> = visible.into_iter().cloned().collect();
        if !visible.is_empty() && visible == self.ids {
            self.ids.clear();
        } else {
            self.ids = visible;
        }
    }

    /// Drop every selected id.
    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Remove specific ids (e.g. after they were deleted).
    pub fn forget(&mut self, ids: &[ItemId]) {
        for id in ids {
            self.ids.remove(id);
        }
    }

    /// Whether `id` is selected.
    pub fn contains(&self, id: &ItemId) -> bool {
        self.ids.contains(id)
    }

    /// Number of selected items.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Selected ids in a stable order.
    pub fn ids(&self) -> Vec<ItemId> {
        self.ids.iter().cloned().collect()
    }

    /// Whether the selection holds exactly `ids`.
    pub fn matches(&self, ids: &[ItemId]) -> bool {
        ids.len() == self.ids.len() && ids.iter().all(|id| self.ids.contains(id))
    }
}
