//! Classified drag payloads and the structured move descriptor.

use serde::{Deserialize, Serialize};

use vault_core::types::ItemId;

use crate::item::FileBlob;

/// Declared kind under which a drag source advertises raw file content.
pub const FILES_KIND: &str = "Files";

/// Private data key carrying the JSON move descriptor.
///
/// Unrelated drag sources never declare this key, so they can never be
/// mistaken for an internal move.
pub const MOVE_DATA_KEY: &str = "application/x-modelvault-items+json";

/// The structured descriptor an internal item drag attaches to the event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveDescriptor {
    /// Items being relocated, in drag order.
    pub item_ids: Vec<ItemId>,
}

impl MoveDescriptor {
    /// Serialize the descriptor for the drag event's data channel.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{\"itemIds\":[]}".to_string())
    }

    /// Parse a descriptor, returning `None` for anything malformed.
    pub fn from_json(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }
}

/// What a drag gesture carries, resolved once and passed downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragPayload {
    /// Files dragged in from outside the application.
    FileDrop {
        /// The dropped files, in order. Empty while hovering: content is
        /// only readable on drop.
        files: Vec<FileBlob>,
    },
    /// Items already in the collection being relocated.
    ItemMove {
        /// Ordered, deduplicated item ids.
        item_ids: Vec<ItemId>,
    },
}

impl DragPayload {
    /// Whether this is an external file drag.
    pub fn is_file_drop(&self) -> bool {
        matches!(self, Self::FileDrop { .. })
    }
}
