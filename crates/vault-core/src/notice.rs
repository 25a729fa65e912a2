//! User-facing notices emitted by the sync layer.
//!
//! A notice is the only form in which a remote failure reaches the user:
//! raw transport errors stay in the logs, the notice carries a uniform,
//! user-safe message.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    /// Informational (e.g. a partially successful download).
    Info,
    /// Something was skipped but the operation completed.
    Warning,
    /// A mutation failed at the remote store.
    Error,
}

/// A non-blocking notification for the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notice {
    /// Unique notice ID.
    pub id: Uuid,
    /// When the notice was raised.
    pub timestamp: DateTime<Utc>,
    /// Severity.
    pub level: NoticeLevel,
    /// Short label of the operation (e.g. `"bulk_move"`).
    pub operation: String,
    /// Human-readable message.
    pub message: String,
    /// Whether local state was reverted after the failure.
    pub rolled_back: bool,
}

impl Notice {
    /// Create a new notice.
    pub fn new(level: NoticeLevel, operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            level,
            operation: operation.into(),
            message: message.into(),
            rolled_back: false,
        }
    }

    /// Create an error notice for a failed remote mutation.
    pub fn failure(operation: impl Into<String>, message: impl Into<String>, rolled_back: bool) -> Self {
        Self {
            rolled_back,
            ..Self::new(NoticeLevel::Error, operation, message)
        }
    }

    /// Whether this notice reports a failure.
    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}
