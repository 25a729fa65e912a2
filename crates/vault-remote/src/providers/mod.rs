//! Remote store provider implementations.

#[cfg(feature = "http")]
pub mod http;
pub mod memory;

#[cfg(feature = "http")]
pub use http::HttpStore;
pub use memory::{MemoryStore, RecordedCall};
