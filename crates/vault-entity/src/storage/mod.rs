//! Storage usage entities.

pub mod usage;

pub use usage::StorageUsage;
