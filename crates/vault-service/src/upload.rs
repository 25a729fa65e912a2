//! Upload flow types and the collaborators it consults.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use vault_core::result::AppResult;
use vault_core::types::FolderId;
use vault_entity::item::{FileBlob, Item};

/// File extensions the thumbnail renderer is asked to handle.
pub const RENDERABLE_EXTENSIONS: &[&str] = &["stl", "3mf"];

/// Renders a preview snapshot for a model file.
#[async_trait]
pub trait ThumbnailRenderer: Send + Sync + std::fmt::Debug + 'static {
    /// Render `file` to an opaque image reference (usually a data URL).
    /// `Ok(None)` means the renderer declined the file.
    async fn render(&self, file: &FileBlob) -> AppResult<Option<String>>;
}

/// Tags and description proposed for an item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataSuggestion {
    /// Proposed tags, unioned into the item's existing set.
    pub tags: Vec<String>,
    /// Proposed description; empty keeps the current one.
    pub description: String,
}

/// Proposes metadata for an item from its name and description.
#[async_trait]
pub trait MetadataGenerator: Send + Sync + std::fmt::Debug + 'static {
    /// Produce a suggestion for the named item.
    async fn suggest(&self, name: &str, description: &str) -> AppResult<MetadataSuggestion>;
}

/// Whether a file should be sent to the thumbnail renderer.
pub fn is_renderable(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .is_some_and(|ext| RENDERABLE_EXTENSIONS.contains(&ext.as_str()))
}

/// Parse a comma-separated tag list: trimmed, empties dropped, duplicates
/// removed (first occurrence wins).
pub fn parse_tag_list(input: &str) -> Vec<String> {
    normalize_tags(input.split(','))
}

/// Trim tags, dropping empty ones and exact duplicates (first wins).
pub fn normalize_tags<I>(tags: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut normalized: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim();
        if !tag.is_empty() && !normalized.iter().any(|existing| existing == tag) {
            normalized.push(tag.to_string());
        }
    }
    normalized
}

/// Files dropped without a concrete destination, awaiting confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpload {
    /// Files to upload once a destination is chosen.
    pub files: Vec<FileBlob>,
    /// Pre-selected destination (first folder by name), if any folder exists.
    pub suggested_folder: Option<FolderId>,
    /// Tags to attach to every uploaded file.
    pub tags: Vec<String>,
}

impl PendingUpload {
    /// Create a pending upload with no tags.
    pub fn new(files: Vec<FileBlob>, suggested_folder: Option<FolderId>) -> Self {
        Self {
            files,
            suggested_folder,
            tags: Vec::new(),
        }
    }

    /// Total size of the pending files in bytes.
    pub fn total_size(&self) -> u64 {
        self.files.iter().map(FileBlob::size).sum()
    }
}

/// Result of uploading a batch of files one at a time.
#[derive(Debug, Clone, Default)]
pub struct UploadReport {
    /// Items the store accepted.
    pub uploaded: Vec<Item>,
    /// Names of files the store rejected.
    pub failed: Vec<String>,
}

impl UploadReport {
    /// Whether every file was stored.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}
