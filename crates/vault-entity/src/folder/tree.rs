//! Folder tree structures for hierarchical display.

use serde::{Deserialize, Serialize};

use vault_core::types::FolderId;

/// A node in a rendered folder tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderNode {
    /// Folder ID.
    pub id: FolderId,
    /// Folder name.
    pub name: String,
    /// Depth level (0 for root folders).
    pub depth: usize,
    /// Number of direct child folders.
    pub child_count: usize,
    /// Number of items directly inside this folder.
    pub item_count: usize,
    /// Child folder nodes, sorted by name.
    pub children: Vec<FolderNode>,
}

impl FolderNode {
    /// Whether this node has neither items nor child folders.
    pub fn is_empty(&self) -> bool {
        self.child_count == 0 && self.item_count == 0
    }
}
