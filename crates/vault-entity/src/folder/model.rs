//! Folder entity model.

use serde::{Deserialize, Serialize};

use vault_core::types::FolderId;

/// A folder in the organization hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    /// Unique folder identifier.
    pub id: FolderId,
    /// Folder name.
    pub name: String,
    /// Parent folder ID (None for root-level folders).
    #[serde(default)]
    pub parent_id: Option<FolderId>,
}

impl Folder {
    /// Create a folder value.
    pub fn new(id: FolderId, name: impl Into<String>, parent_id: Option<FolderId>) -> Self {
        Self {
            id,
            name: name.into(),
            parent_id,
        }
    }

    /// Check if this is a root folder (no parent).
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Whether the id is a local placeholder awaiting the store's answer.
    pub fn is_pending(&self) -> bool {
        self.id.is_placeholder()
    }
}
