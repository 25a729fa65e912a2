//! # vault-remote
//!
//! The remote store contract consumed by the ModelVault sync layer, and its
//! providers: a REST binding over HTTP and an in-process memory store.

pub mod connect;
pub mod providers;
pub mod store;

pub use connect::connect;
pub use store::RemoteStore;
