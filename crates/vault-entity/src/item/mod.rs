//! Item domain entities.

pub mod model;
pub mod patch;
pub mod upload;

pub use model::{Dimensions, Item};
pub use patch::ItemPatch;
pub use upload::{FileBlob, UploadItem};
