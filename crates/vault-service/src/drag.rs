//! Drag-and-drop interaction resolver.
//!
//! A drag gesture is classified from what its source *declares*, never by
//! sniffing content: a source declaring [`FILES_KIND`] is an external file
//! drop; a source carrying a move descriptor under [`MOVE_DATA_KEY`] is an
//! internal item move; anything else is ignored. The resolver also tracks
//! the hovered drop target and the canvas overlay, and turns a drop into a
//! [`DropAction`] the library executes.

use std::collections::HashMap;

use tracing::debug;

use vault_core::types::{FolderFilter, FolderId, ItemId};
use vault_entity::drag::{DragPayload, FILES_KIND, MOVE_DATA_KEY, MoveDescriptor};
use vault_entity::item::FileBlob;

use crate::selection::Selection;

/// What a drag source declares on its data channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DragData {
    kinds: Vec<String>,
    entries: HashMap<String, String>,
    files: Vec<FileBlob>,
}

impl DragData {
    /// A drag that declares nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// An external file drag carrying `files`.
    pub fn with_files(files: Vec<FileBlob>) -> Self {
        Self {
            files,
            ..Self::new().declare(FILES_KIND)
        }
    }

    /// Declare a kind without attaching data.
    pub fn declare(mut self, kind: impl Into<String>) -> Self {
        let kind = kind.into();
        if !self.kinds.contains(&kind) {
            self.kinds.push(kind);
        }
        self
    }

    /// Attach string data under `key`, declaring it as a kind.
    pub fn set_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        self = self.declare(key.clone());
        self.entries.insert(key, value.into());
        self
    }

    /// Whether the source declared `kind`.
    pub fn has_kind(&self, kind: &str) -> bool {
        self.kinds.iter().any(|k| k == kind)
    }

    /// Data attached under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Attached files (empty until drop for real drag sources).
    pub fn files(&self) -> &[FileBlob] {
        &self.files
    }
}

/// Classify a drag from its declared kinds.
pub fn resolve_payload(data: &DragData) -> Option<DragPayload> {
    if data.has_kind(FILES_KIND) {
        return Some(DragPayload::FileDrop {
            files: data.files().to_vec(),
        });
    }

    let descriptor = MoveDescriptor::from_json(data.get(MOVE_DATA_KEY)?)?;
    let mut item_ids: Vec<ItemId> = Vec::with_capacity(descriptor.item_ids.len());
    for id in descriptor.item_ids {
        if !item_ids.contains(&id) {
            item_ids.push(id);
        }
    }
    if item_ids.is_empty() {
        return None;
    }
    Some(DragPayload::ItemMove { item_ids })
}

/// Build the drag data for an item drag started on `item`.
///
/// When the item is part of the selection the whole selection travels with
/// it; otherwise only the item does.
pub fn begin_item_drag(item: &ItemId, selection: &Selection) -> DragData {
    let item_ids = if selection.contains(item) {
        selection.ids()
    } else {
        vec![item.clone()]
    };
    DragData::new().set_data(MOVE_DATA_KEY, MoveDescriptor { item_ids }.to_json())
}

/// A region that can receive a drop.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DropZone {
    /// A folder node in the tree.
    Folder(FolderId),
    /// The library root canvas (the item grid).
    Canvas,
}

/// What the library should do with a drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropAction {
    /// Upload files directly into a folder.
    Upload {
        /// Files to store.
        files: Vec<FileBlob>,
        /// Destination.
        folder_id: FolderId,
    },
    /// Files were dropped with no concrete destination; ask the user.
    ChooseDestination {
        /// Files awaiting a destination.
        files: Vec<FileBlob>,
    },
    /// Move existing items into a folder.
    Move {
        /// Items to relocate, in drag order.
        item_ids: Vec<ItemId>,
        /// Destination.
        folder_id: FolderId,
    },
    /// Nothing to do.
    Ignore,
}

/// Hover and drop state for one drag gesture at a time.
#[derive(Debug, Clone, Default)]
pub struct DragResolver {
    target: Option<FolderId>,
    canvas_active: bool,
}

impl DragResolver {
    /// Create an idle resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// The folder currently highlighted as drop target.
    pub fn target(&self) -> Option<&FolderId> {
        self.target.as_ref()
    }

    /// Whether the canvas upload overlay is showing.
    pub fn canvas_active(&self) -> bool {
        self.canvas_active
    }

    /// Handle drag-enter (and drag-over) on `zone`.
    pub fn enter(&mut self, zone: &DropZone, data: &DragData) -> Option<DragPayload> {
        let payload = resolve_payload(data);
        match (zone, &payload) {
            (DropZone::Folder(id), Some(_)) => self.target = Some(id.clone()),
            (DropZone::Canvas, Some(p)) if p.is_file_drop() => self.canvas_active = true,
            _ => {}
        }
        payload
    }

    /// Handle drag-leave from `zone`. `related` is the zone the pointer
    /// moved into, if any; moving within the same zone is ignored.
    pub fn leave(&mut self, zone: &DropZone, related: Option<&DropZone>) {
        if related == Some(zone) {
            return;
        }
        match zone {
            DropZone::Folder(id) => {
                if self.target.as_ref() == Some(id) {
                    self.target = None;
                }
            }
            DropZone::Canvas => self.canvas_active = false,
        }
    }

    /// Forget any hover state (drag cancelled or ended elsewhere).
    pub fn reset(&mut self) {
        self.target = None;
        self.canvas_active = false;
    }

    /// Handle a drop on `zone`, re-resolving the payload.
    pub fn drop(&mut self, zone: &DropZone, data: &DragData, navigation: &FolderFilter) -> DropAction {
        self.reset();
        let action = match (resolve_payload(data), zone) {
            (Some(DragPayload::FileDrop { files }), _) if files.is_empty() => DropAction::Ignore,
            (Some(DragPayload::FileDrop { files }), DropZone::Folder(folder_id)) => {
                DropAction::Upload {
                    files,
                    folder_id: folder_id.clone(),
                }
            }
            (Some(DragPayload::FileDrop { files }), DropZone::Canvas) => match navigation {
                FolderFilter::Folder(folder_id) => DropAction::Upload {
                    files,
                    folder_id: folder_id.clone(),
                },
                FolderFilter::All => DropAction::ChooseDestination { files },
            },
            (Some(DragPayload::ItemMove { item_ids }), DropZone::Folder(folder_id)) => {
                DropAction::Move {
                    item_ids,
                    folder_id: folder_id.clone(),
                }
            }
            (Some(DragPayload::ItemMove { .. }), DropZone::Canvas) | (None, _) => DropAction::Ignore,
        };
        debug!(zone = ?zone, action = action_label(&action), "Drop resolved");
        action
    }
}

fn action_label(action: &DropAction) -> &'static str {
    match action {
        DropAction::Upload { .. } => "upload",
        DropAction::ChooseDestination { .. } => "choose_destination",
        DropAction::Move { .. } => "move",
        DropAction::Ignore => "ignore",
    }
}
