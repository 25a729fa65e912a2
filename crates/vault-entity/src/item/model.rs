//! Item (model asset) entity.

use std::collections::BTreeSet;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use vault_core::types::{FolderId, ItemId};

/// Bounding-box dimensions reported by the rendering collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Extent along X.
    pub x: f64,
    /// Extent along Y.
    pub y: f64,
    /// Extent along Z.
    pub z: f64,
}

/// A stored 3D model file and its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Unique item identifier.
    pub id: ItemId,
    /// The file name (including extension).
    pub name: String,
    /// The folder containing this item.
    pub folder_id: FolderId,
    /// Content size in bytes.
    pub size: u64,
    /// When the item was added, in milliseconds since the epoch.
    pub date_added: i64,
    /// Case-sensitive, deduplicated tag set.
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Opaque thumbnail reference (usually a data URL).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    /// Bounding-box dimensions, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
    /// Content reference assigned by the store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Item {
    /// Union `tags` into this item's tag set, returning how many were new.
    pub fn add_tags<'a>(&mut self, tags: impl IntoIterator<Item = &'a String>) -> usize {
        tags.into_iter()
            .filter(|tag| self.tags.insert((*tag).clone()))
            .count()
    }

    /// Whether the item carries the exact (case-sensitive) tag.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Get the file extension (lowercase), if any.
    pub fn extension(&self) -> Option<String> {
        self.name
            .rsplit('.')
            .next()
            .filter(|ext| *ext != self.name)
            .map(|ext| ext.to_lowercase())
    }

    /// The `date_added` timestamp as a UTC datetime.
    pub fn added_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.date_added).single()
    }

    /// Whether the id is a local placeholder awaiting the store's answer.
    pub fn is_pending(&self) -> bool {
        self.id.is_placeholder()
    }
}
