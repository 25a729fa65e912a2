//! Drag-and-drop payload entities.

pub mod payload;

pub use payload::{DragPayload, FILES_KIND, MOVE_DATA_KEY, MoveDescriptor};
