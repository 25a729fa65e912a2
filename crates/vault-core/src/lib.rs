//! # vault-core
//!
//! Core crate for ModelVault. Contains configuration schemas, typed
//! identifiers, the folder filter, user-facing notices, and the unified
//! error system.
//!
//! This crate has **no** internal dependencies on other ModelVault crates.

pub mod config;
pub mod error;
pub mod notice;
pub mod result;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
