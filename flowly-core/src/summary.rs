//! Plan summary statistics.

use serde::{Deserialize, Serialize};

use crate::plan::Plan;
use crate::task::{DEFAULT_DURATION_MINUTES, Task};
use crate::time::round1;

/// Reporting denominator: an 8h day minus the 10% buffer.
///
/// Fixed on purpose; it does not follow the `workday_hours` used for allocation.
pub const REPORTING_CAPACITY_MINUTES: u32 = 432;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub total_tasks: usize,
    pub total_minutes: u64,
    pub total_hours: f64,
    pub capacity_used_percent: f64,
}

impl PlanSummary {
    pub fn of(plan: &Plan) -> Self {
        Self::from_durations(plan.items.iter().map(|i| i.duration_minutes))
    }

    pub fn of_tasks(tasks: &[&Task]) -> Self {
        Self::from_durations(tasks.iter().map(|t| Some(t.duration_minutes)))
    }

    fn from_durations(durations: impl Iterator<Item = Option<u32>>) -> Self {
        let mut total_tasks = 0;
        let mut total_minutes = 0;
        for d in durations {
            total_tasks += 1;
            total_minutes += u64::from(match d {
                Some(0) | None => DEFAULT_DURATION_MINUTES,
                Some(m) => m,
            });
        }

        if total_tasks == 0 {
            return Self {
                total_tasks: 0,
                total_minutes: 0,
                total_hours: 0.0,
                capacity_used_percent: 0.0,
            };
        }

        let minutes = total_minutes as f64;
        Self {
            total_tasks,
            total_minutes,
            total_hours: round1(minutes / 60.0),
            capacity_used_percent: round1(minutes / f64::from(REPORTING_CAPACITY_MINUTES) * 100.0),
        }
    }
}
