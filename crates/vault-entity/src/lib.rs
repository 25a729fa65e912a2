//! # vault-entity
//!
//! Domain entity models for ModelVault. Every struct in this crate is a
//! value object mirrored from the remote store (folders, items, usage) or
//! produced by a user gesture (drag payloads, uploads). All entities derive
//! `Debug` and `Clone`; wire types additionally derive `Serialize` and
//! `Deserialize` with the store's camelCase field names.

pub mod drag;
pub mod folder;
pub mod item;
pub mod storage;
