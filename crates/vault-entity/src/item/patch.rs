//! Partial item updates.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::model::{Dimensions, Item};

/// Partial update of an item's editable fields.
///
/// `None` fields are left untouched and omitted from the wire body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPatch {
    /// New file name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Replacement tag set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeSet<String>>,
    /// New thumbnail reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    /// Measured dimensions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
}

impl ItemPatch {
    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.tags.is_none()
            && self.thumbnail.is_none()
            && self.dimensions.is_none()
    }

    /// Apply the patch to an item in place.
    pub fn apply_to(&self, item: &mut Item) {
        if let Some(name) = &self.name {
            item.name = name.clone();
        }
        if let Some(description) = &self.description {
            item.description = description.clone();
        }
        if let Some(tags) = &self.tags {
            item.tags = tags.clone();
        }
        if let Some(thumbnail) = &self.thumbnail {
            item.thumbnail = Some(thumbnail.clone());
        }
        if let Some(dimensions) = self.dimensions {
            item.dimensions = Some(dimensions);
        }
    }

    /// Names of the fields this patch touches, for logging.
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.name.is_some() {
            fields.push("name");
        }
        if self.description.is_some() {
            fields.push("description");
        }
        if self.tags.is_some() {
            fields.push("tags");
        }
        if self.thumbnail.is_some() {
            fields.push("thumbnail");
        }
        if self.dimensions.is_some() {
            fields.push("dimensions");
        }
        fields
    }
}
