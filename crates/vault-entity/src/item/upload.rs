//! File blobs and upload requests.

use bytes::Bytes;

use vault_core::types::FolderId;

/// An opaque binary file handed over by the user (drop or file picker).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileBlob {
    /// Original file name.
    pub name: String,
    /// File content.
    pub data: Bytes,
}

impl FileBlob {
    /// Create a blob from a name and its content.
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }

    /// Content size in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Lowercase file extension, if any.
    pub fn extension(&self) -> Option<String> {
        self.name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
    }
}

/// Request to store a new item.
#[derive(Debug, Clone)]
pub struct UploadItem {
    /// The file to store.
    pub file: FileBlob,
    /// Destination folder.
    pub folder_id: FolderId,
    /// Optional thumbnail reference produced before upload.
    pub thumbnail: Option<String>,
    /// Initial tags.
    pub tags: Vec<String>,
}
