//! Core type definitions used across the ModelVault workspace.

pub mod filter;
pub mod id;

pub use filter::FolderFilter;
pub use id::*;
