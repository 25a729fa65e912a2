//! Newtype wrappers around opaque string identifiers.
//!
//! Identifiers are assigned by the remote store and are treated as opaque
//! strings. Using distinct types prevents accidentally passing an `ItemId`
//! where a `FolderId` is expected. Locally synthesized identifiers (used for
//! optimistic placeholders until the store answers) carry a `pending-`
//! prefix.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The reserved pseudo-folder id meaning "no filter / library root".
pub const ALL_FOLDERS: &str = "all";

/// Prefix of locally synthesized placeholder identifiers.
pub const PLACEHOLDER_PREFIX: &str = "pending-";

/// Error returned when a string cannot be used as an identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The identifier was empty or whitespace.
    #[error("identifier must not be empty")]
    Empty,
    /// The identifier is reserved and cannot name a real entity.
    #[error("identifier '{0}' is reserved")]
    Reserved(String),
}

/// Macro to define a newtype ID wrapper around `String`.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident, reserved = [$($reserved:expr),*]
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Parse an identifier, rejecting empty and reserved values.
            pub fn parse(value: impl Into<String>) -> Result<Self, IdError> {
                let value = value.into();
                if value.trim().is_empty() {
                    return Err(IdError::Empty);
                }
                $(
                    if value == $reserved {
                        return Err(IdError::Reserved(value));
                    }
                )*
                Ok(Self(value))
            }

            /// Create a locally synthesized placeholder identifier.
            pub fn placeholder() -> Self {
                Self(format!("{PLACEHOLDER_PREFIX}{}", Uuid::new_v4()))
            }

            /// Create a random identifier (used by in-process stores).
            pub fn generate() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            /// Whether this id was synthesized locally and not yet confirmed.
            pub fn is_placeholder(&self) -> bool {
                self.0.starts_with(PLACEHOLDER_PREFIX)
            }

            /// Return the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> String {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(
    /// Unique identifier for a folder. Can never hold the `"all"` pseudo-id.
    FolderId, reserved = [ALL_FOLDERS]
);

define_id!(
    /// Unique identifier for a stored item (model asset).
    ItemId, reserved = []
);
