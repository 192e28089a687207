//! Ranking comparator: the business order of eligible tasks.
//!
//! Most significant first:
//! - pinned before everything else
//! - urgency: overdue/due today < future deadline < no deadline
//! - priority: high < medium < low
//! - shorter duration first
//! - earlier `created_at` first, missing last
//! - lower id first, so the order never depends on input order

use chrono::{DateTime, NaiveDate, Utc};
use std::cmp::Ordering;

use crate::task::{Priority, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Urgency {
    /// Deadline on or before the reference date.
    Urgent,
    /// Deadline after the reference date.
    Upcoming,
    /// No deadline.
    Unscheduled,
}

impl Urgency {
    pub fn of(task: &Task, reference_date: NaiveDate) -> Self {
        match task.deadline {
            Some(d) if d <= reference_date => Urgency::Urgent,
            Some(_) => Urgency::Upcoming,
            None => Urgency::Unscheduled,
        }
    }
}

/// Composite sort key for one task on one reference date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankKey {
    pub pinned: bool,
    pub urgency: Urgency,
    pub priority: Priority,
    pub duration_minutes: u32,
    pub created_at: Option<DateTime<Utc>>,
    pub id: i64,
}

impl RankKey {
    pub fn for_task(task: &Task, reference_date: NaiveDate) -> Self {
        Self {
            pinned: task.is_pinned,
            urgency: Urgency::of(task, reference_date),
            priority: task.priority,
            duration_minutes: task.normalized_duration(),
            created_at: task.created_at,
            id: task.id,
        }
    }
}

impl PartialOrd for RankKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RankKey {
    fn cmp(&self, other: &Self) -> Ordering {
        // pinned = true must come first, so compare reversed.
        other
            .pinned
            .cmp(&self.pinned)
            .then_with(|| self.urgency.cmp(&other.urgency))
            .then_with(|| self.priority.cmp(&other.priority))
            .then_with(|| self.duration_minutes.cmp(&other.duration_minutes))
            .then_with(|| created_order(self.created_at, other.created_at))
            .then_with(|| self.id.cmp(&other.id))
    }
}

fn created_order(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn compare(a: &Task, b: &Task, reference_date: NaiveDate) -> Ordering {
    RankKey::for_task(a, reference_date).cmp(&RankKey::for_task(b, reference_date))
}

/// Sort tasks into plan order.
pub fn rank_tasks<'a>(
    tasks: impl IntoIterator<Item = &'a Task>,
    reference_date: NaiveDate,
) -> Vec<&'a Task> {
    let mut ranked: Vec<&Task> = tasks.into_iter().collect();
    ranked.sort_by_cached_key(|t| RankKey::for_task(t, reference_date));
    ranked
}
