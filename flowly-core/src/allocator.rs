//! Capacity allocator: greedy fill of ranked tasks into one workday.
//!
//! - 10% of the day is held back as buffer.
//! - Tasks are atomic; a task that does not fit is skipped and later (smaller)
//!   tasks may still fill the gap.
//! - A task longer than the whole usable day is appended and ends the pass.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::task::Task;

pub const DEFAULT_WORKDAY_HOURS: u32 = 8;
pub const BUFFER_PERCENT: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capacity {
    pub total_minutes: u32,
    pub buffer_minutes: u32,
    pub effective_minutes: u32,
}

impl Capacity {
    pub fn for_workday(workday_hours: u32) -> Self {
        let total_minutes = workday_hours * 60;
        // floor(total * 0.10)
        let buffer_minutes = total_minutes * BUFFER_PERCENT / 100;
        Self {
            total_minutes,
            buffer_minutes,
            effective_minutes: total_minutes - buffer_minutes,
        }
    }
}

impl Default for Capacity {
    fn default() -> Self {
        Self::for_workday(DEFAULT_WORKDAY_HOURS)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Allocation<'a> {
    /// Selected tasks in ranking order; index + 1 is the rank.
    pub selected: Vec<&'a Task>,
    /// Set when a task larger than the usable day ended the pass.
    pub overflow: Option<i64>,
    pub remaining_minutes: u32,
}

impl Allocation<'_> {
    pub fn planned_minutes(&self) -> u64 {
        self.selected.iter().map(|t| u64::from(t.normalized_duration())).sum()
    }
}

pub fn allocate<'a>(ranked: &[&'a Task], capacity: Capacity) -> Allocation<'a> {
    let mut remaining = capacity.effective_minutes;
    let mut selected = Vec::new();
    let mut overflow = None;

    for task in ranked {
        let duration = task.normalized_duration();

        if duration > capacity.effective_minutes {
            warn!(
                task_id = task.id,
                title = %task.title,
                duration_minutes = duration,
                effective_minutes = capacity.effective_minutes,
                "task takes the full day; stopping allocation"
            );
            selected.push(*task);
            overflow = Some(task.id);
            remaining = 0;
            break;
        }

        if duration <= remaining {
            selected.push(*task);
            remaining -= duration;
        }
    }

    Allocation {
        selected,
        overflow,
        remaining_minutes: remaining,
    }
}
