//! Stored task rows and their conversion into engine tasks.

use chrono::{DateTime, NaiveDate, Utc};
use flowly_core::{DEFAULT_DURATION_MINUTES, Priority, Task};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::status::CanonicalStatus;

/// Task as persisted. `priority` is 1..=5 with 1 the most important;
/// `status` keeps the stored (possibly legacy) spelling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredTask {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<u8>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    pub status: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_blocked: bool,
    #[serde(default)]
    pub is_pinned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for a new task. Unset fields take store defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<u8>,
    pub duration_minutes: Option<u32>,
    pub deadline: Option<DateTime<Utc>>,
    pub status: Option<CanonicalStatus>,
    pub start_date: Option<NaiveDate>,
    pub tags: Vec<String>,
    pub is_blocked: bool,
    pub is_pinned: bool,
}

/// 1..=2 high, 3 medium, 4..=5 low; unset is medium.
pub fn engine_priority(stored: Option<u8>) -> Priority {
    match stored {
        None => Priority::Medium,
        Some(p) if p <= 2 => Priority::High,
        Some(3) => Priority::Medium,
        Some(_) => Priority::Low,
    }
}

impl StoredTask {
    pub fn canonical_status(&self) -> CanonicalStatus {
        CanonicalStatus::from_stored(&self.status).unwrap_or_else(|| {
            warn!(
                task_id = self.id,
                status = %self.status,
                "unknown stored status; treating as pending"
            );
            CanonicalStatus::Pending
        })
    }

    pub fn is_plannable(&self) -> bool {
        !self.canonical_status().is_terminal()
    }

    /// Canonical engine view of this row. `None` for cancelled tasks.
    pub fn to_engine_task(&self) -> Option<Task> {
        let status = self.canonical_status().engine_status()?;
        Some(Task {
            id: self.id,
            title: self.title.clone(),
            description: self.description.clone(),
            priority: engine_priority(self.priority),
            status,
            duration_minutes: self
                .duration_minutes
                .filter(|m| *m > 0)
                .unwrap_or(DEFAULT_DURATION_MINUTES),
            deadline: self.deadline.map(|d| d.date_naive()),
            created_at: Some(self.created_at),
            start_date: self.start_date,
            is_blocked: self.is_blocked,
            tags: self.tags.clone(),
            is_pinned: self.is_pinned,
        })
    }

    pub fn apply_patch(&mut self, patch: &TaskPatch, now: DateTime<Utc>) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(duration) = patch.duration_minutes {
            self.duration_minutes = duration;
        }
        if let Some(deadline) = patch.deadline {
            self.deadline = deadline;
        }
        if let Some(status) = patch.status {
            self.status = status.to_stored().to_string();
        }
        if let Some(start_date) = patch.start_date {
            self.start_date = start_date;
        }
        if let Some(tags) = &patch.tags {
            self.tags = tags.clone();
        }
        if let Some(blocked) = patch.is_blocked {
            self.is_blocked = blocked;
        }
        if let Some(pinned) = patch.is_pinned {
            self.is_pinned = pinned;
        }
        self.updated_at = now;
    }
}

/// Partial update of a stored task. Only fields that were set are applied;
/// `Some(None)` clears a nullable field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    title: Option<String>,
    description: Option<Option<String>>,
    priority: Option<Option<u8>>,
    duration_minutes: Option<Option<u32>>,
    deadline: Option<Option<DateTime<Utc>>>,
    status: Option<CanonicalStatus>,
    start_date: Option<Option<NaiveDate>>,
    tags: Option<Vec<String>>,
    is_blocked: Option<bool>,
    is_pinned: Option<bool>,
}

impl TaskPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    pub fn priority(mut self, priority: Option<u8>) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn duration_minutes(mut self, minutes: Option<u32>) -> Self {
        self.duration_minutes = Some(minutes);
        self
    }

    pub fn deadline(mut self, deadline: Option<DateTime<Utc>>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn status(mut self, status: CanonicalStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn start_date(mut self, start_date: Option<NaiveDate>) -> Self {
        self.start_date = Some(start_date);
        self
    }

    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }

    pub fn blocked(mut self, blocked: bool) -> Self {
        self.is_blocked = Some(blocked);
        self
    }

    pub fn pinned(mut self, pinned: bool) -> Self {
        self.is_pinned = Some(pinned);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use flowly_core::Status;

    fn row(status: &str) -> StoredTask {
        let at = Utc.with_ymd_and_hms(2026, 1, 5, 10, 0, 0).unwrap();
        StoredTask {
            id: 1,
            title: "Pay rent".into(),
            description: None,
            priority: Some(2),
            duration_minutes: None,
            deadline: Some(Utc.with_ymd_and_hms(2026, 1, 31, 18, 0, 0).unwrap()),
            status: status.into(),
            start_date: None,
            tags: vec![],
            is_blocked: false,
            is_pinned: false,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn priority_buckets() {
        assert_eq!(engine_priority(Some(1)), Priority::High);
        assert_eq!(engine_priority(Some(2)), Priority::High);
        assert_eq!(engine_priority(Some(3)), Priority::Medium);
        assert_eq!(engine_priority(Some(5)), Priority::Low);
        assert_eq!(engine_priority(None), Priority::Medium);
    }

    #[test]
    fn legacy_row_converts_to_canonical_task() {
        let t = row("todo").to_engine_task().unwrap();
        assert_eq!(t.status, Status::Todo);
        assert_eq!(t.priority, Priority::High);
        assert_eq!(t.duration_minutes, 30);
        assert_eq!(t.deadline, NaiveDate::from_ymd_opt(2026, 1, 31));

        assert_eq!(row("done").to_engine_task().unwrap().status, Status::Done);
        assert!(row("cancelled").to_engine_task().is_none());
    }

    #[test]
    fn plannable_excludes_terminal_states() {
        assert!(row("todo").is_plannable());
        assert!(row("in_progress").is_plannable());
        assert!(!row("done").is_plannable());
        assert!(!row("completed").is_plannable());
        assert!(!row("cancelled").is_plannable());
    }

    #[test]
    fn patch_touches_only_set_fields() {
        let mut t = row("todo");
        let later = t.updated_at + chrono::Duration::hours(1);
        let patch = TaskPatch::new()
            .status(CanonicalStatus::Completed)
            .deadline(None)
            .pinned(true);
        t.apply_patch(&patch, later);

        assert_eq!(t.status, "done");
        assert!(t.deadline.is_none());
        assert!(t.is_pinned);
        assert_eq!(t.title, "Pay rent");
        assert_eq!(t.priority, Some(2));
        assert_eq!(t.updated_at, later);
    }

    #[test]
    fn empty_patch() {
        assert!(TaskPatch::new().is_empty());
        assert!(!TaskPatch::new().title("x").is_empty());
    }
}
