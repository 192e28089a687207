//! Plan output types.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanItem {
    pub task_id: i64,
    /// 1-based, ascending = earlier.
    pub priority_rank: u32,
    pub duration_minutes: Option<u32>,
    pub planned_start: Option<DateTime<FixedOffset>>,
    pub planned_end: Option<DateTime<FixedOffset>>,
    pub note: Option<String>,
}

impl PlanItem {
    pub fn new(task_id: i64, priority_rank: u32) -> Self {
        Self {
            task_id,
            priority_rank,
            duration_minutes: None,
            planned_start: None,
            planned_end: None,
            note: None,
        }
    }

    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.duration_minutes = Some(minutes);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub generated_at: DateTime<Utc>,
    pub timezone: String,
    pub items: Vec<PlanItem>,
}

impl Plan {
    pub fn empty(generated_at: DateTime<Utc>, timezone: impl Into<String>) -> Self {
        Self {
            generated_at,
            timezone: timezone.into(),
            items: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn task_ids(&self) -> Vec<i64> {
        self.items.iter().map(|i| i.task_id).collect()
    }

    /// Ranks are exactly `1..=N` in item order.
    pub fn has_contiguous_ranks(&self) -> bool {
        self.items
            .iter()
            .enumerate()
            .all(|(i, item)| item.priority_rank as usize == i + 1)
    }

    /// Rewrite ranks to `1..=N` following the current item order.
    pub fn renumber(&mut self) {
        for (i, item) in self.items.iter_mut().enumerate() {
            item.priority_rank = (i + 1) as u32;
        }
    }
}
