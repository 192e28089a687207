//! Eligibility filter: which tasks may be scheduled on a given day.

use chrono::NaiveDate;

use crate::task::{Status, Task};

pub fn is_eligible(task: &Task, reference_date: NaiveDate) -> bool {
    if task.status == Status::Done {
        return false;
    }
    if task.is_blocked {
        return false;
    }
    if task.start_date.is_some_and(|start| start > reference_date) {
        return false;
    }
    !task.has_exclusion_tag()
}

/// Eligible tasks in input order.
pub fn eligible_tasks(tasks: &[Task], reference_date: NaiveDate) -> Vec<&Task> {
    tasks
        .iter()
        .filter(|t| is_eligible(t, reference_date))
        .collect()
}
