//! Task model for the daily planning engine.
//!
//! The engine only ever sees canonical values. Mapping of stored/legacy
//! representations happens in `flowly-store`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Duration assumed when upstream did not record one.
pub const DEFAULT_DURATION_MINUTES: u32 = 30;

/// Tags that keep a task out of today's plan.
pub const EXCLUSION_TAGS: [&str; 2] = ["someday", "on_hold"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Todo,
    InProgress,
    Done,
}

/// Read-only task snapshot handed to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,

    pub priority: Priority,
    pub status: Status,

    /// Minutes.
    pub duration_minutes: u32,

    /// Calendar date only, no time of day.
    pub deadline: Option<NaiveDate>,

    /// Final tie-break when ranking. `None` sorts last.
    pub created_at: Option<DateTime<Utc>>,

    /// Not eligible before this date.
    pub start_date: Option<NaiveDate>,

    pub is_blocked: bool,
    pub tags: Vec<String>,
    pub is_pinned: bool,
}

impl Task {
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: None,
            priority: Priority::Medium,
            status: Status::Todo,
            duration_minutes: DEFAULT_DURATION_MINUTES,
            deadline: None,
            created_at: None,
            start_date: None,
            is_blocked: false,
            tags: Vec::new(),
            is_pinned: false,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.duration_minutes = minutes;
        self
    }

    pub fn with_deadline(mut self, deadline: NaiveDate) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn with_start_date(mut self, start_date: NaiveDate) -> Self {
        self.start_date = Some(start_date);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn blocked(mut self) -> Self {
        self.is_blocked = true;
        self
    }

    pub fn pinned(mut self) -> Self {
        self.is_pinned = true;
        self
    }

    /// Duration with the zero case defaulted, so it is always at least one minute.
    pub fn normalized_duration(&self) -> u32 {
        if self.duration_minutes == 0 {
            DEFAULT_DURATION_MINUTES
        } else {
            self.duration_minutes
        }
    }

    pub fn is_overdue(&self, reference_date: NaiveDate) -> bool {
        self.deadline.is_some_and(|d| d < reference_date)
    }

    pub fn is_due_on(&self, reference_date: NaiveDate) -> bool {
        self.deadline.is_some_and(|d| d == reference_date)
    }

    /// Overdue or due on the reference date.
    pub fn is_urgent(&self, reference_date: NaiveDate) -> bool {
        self.deadline.is_some_and(|d| d <= reference_date)
    }

    pub fn has_exclusion_tag(&self) -> bool {
        self.tags
            .iter()
            .any(|t| EXCLUSION_TAGS.contains(&t.as_str()))
    }
}
