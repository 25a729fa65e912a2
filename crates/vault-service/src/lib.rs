//! # vault-service
//!
//! The client-side organization model for ModelVault: an in-memory folder
//! tree and item index, multi-item selection, the drag/drop resolver, the
//! bulk mutation coordinator, and the sync layer that keeps all of it
//! consistent with a remote store that can fail or lag.
//!
//! Components take their dependencies at construction time (`Arc` handles
//! and a shared state cell). [`Library`] wires them together and is the
//! entry point for callers.

pub mod archive;
pub mod bulk;
pub mod drag;
pub mod items;
pub mod library;
pub mod query;
pub mod selection;
pub mod state;
pub mod sync;
pub mod tree;
pub mod upload;

pub use archive::{DownloadArchive, DownloadFailure};
pub use bulk::{BulkCoordinator, BulkTarget};
pub use drag::{DragData, DragResolver, DropAction, DropZone};
pub use items::ItemIndex;
pub use library::{DropResult, Library, UploadOutcome};
pub use query::{ItemQuery, ItemSort};
pub use selection::Selection;
pub use state::{LibraryState, PendingDelete, SharedState};
pub use sync::{Confirmed, Mutation, SyncLayer, SyncOutcome};
pub use tree::FolderTree;
pub use upload::{
    MetadataGenerator, MetadataSuggestion, PendingUpload, ThumbnailRenderer, UploadReport,
    normalize_tags, parse_tag_list,
};
