//! Stored status vocabulary.
//!
//! Rows written by older versions use `todo` / `done`; the API speaks
//! `pending` / `completed`. Both directions go through one table so the
//! engine only ever receives canonical values.

use flowly_core::Status;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

/// (stored value, canonical status). First match wins when reading; the
/// first row per status is what gets written.
const STATUS_TABLE: [(&str, CanonicalStatus); 6] = [
    ("todo", CanonicalStatus::Pending),
    ("in_progress", CanonicalStatus::InProgress),
    ("done", CanonicalStatus::Completed),
    ("cancelled", CanonicalStatus::Cancelled),
    ("pending", CanonicalStatus::Pending),
    ("completed", CanonicalStatus::Completed),
];

impl CanonicalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CanonicalStatus::Pending => "pending",
            CanonicalStatus::InProgress => "in_progress",
            CanonicalStatus::Completed => "completed",
            CanonicalStatus::Cancelled => "cancelled",
        }
    }

    /// Read a stored or API value. Case-insensitive; empty means pending.
    pub fn from_stored(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            return Some(CanonicalStatus::Pending);
        }
        STATUS_TABLE
            .iter()
            .find(|(stored, _)| *stored == normalized)
            .map(|(_, status)| *status)
    }

    /// Value written to storage.
    pub fn to_stored(self) -> &'static str {
        STATUS_TABLE
            .iter()
            .find(|(_, status)| *status == self)
            .map(|(stored, _)| *stored)
            .unwrap_or(self.as_str())
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, CanonicalStatus::Completed | CanonicalStatus::Cancelled)
    }

    /// Engine status; cancelled tasks have none.
    pub fn engine_status(self) -> Option<Status> {
        match self {
            CanonicalStatus::Pending => Some(Status::Todo),
            CanonicalStatus::InProgress => Some(Status::InProgress),
            CanonicalStatus::Completed => Some(Status::Done),
            CanonicalStatus::Cancelled => None,
        }
    }
}

impl std::str::FromStr for CanonicalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_stored(s).ok_or_else(|| format!("unknown status: {s}"))
    }
}
