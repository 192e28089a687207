//! Deterministic day planner: filter, rank, allocate.
//!
//! Also the fallback whenever the AI path fails.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::info;

use crate::allocator::{Capacity, allocate};
use crate::filter::eligible_tasks;
use crate::plan::{Plan, PlanItem};
use crate::ranking::rank_tasks;
use crate::settings::PlanningSettings;
use crate::task::Task;

pub const FALLBACK_NOTE: &str = "Fallback order without AI";

#[derive(Debug, Clone, PartialEq)]
pub struct DayPlan<'a> {
    /// Planned tasks; position + 1 is the priority rank.
    pub tasks: Vec<&'a Task>,
    pub capacity: Capacity,
    /// Id of a task that alone exceeds the usable day, if one ended allocation.
    pub overflow: Option<i64>,
}

/// Rule-based plan for `reference_date`.
pub fn plan_day(tasks: &[Task], reference_date: NaiveDate, workday_hours: u32) -> DayPlan<'_> {
    plan_eligible(eligible_tasks(tasks, reference_date), reference_date, workday_hours)
}

/// Rank and allocate tasks that already passed the eligibility filter.
pub fn plan_eligible<'a>(
    eligible: Vec<&'a Task>,
    reference_date: NaiveDate,
    workday_hours: u32,
) -> DayPlan<'a> {
    let ranked = rank_tasks(eligible, reference_date);
    let capacity = Capacity::for_workday(workday_hours);
    let allocation = allocate(&ranked, capacity);

    if allocation.selected.is_empty() {
        info!(%reference_date, "nothing to plan; all clear for today");
    }

    DayPlan {
        tasks: allocation.selected,
        capacity,
        overflow: allocation.overflow,
    }
}

impl DayPlan<'_> {
    pub fn into_plan(self, timezone: impl Into<String>, generated_at: DateTime<Utc>) -> Plan {
        let items = self
            .tasks
            .iter()
            .enumerate()
            .map(|(i, t)| {
                PlanItem::new(t.id, (i + 1) as u32)
                    .with_duration(t.normalized_duration())
                    .with_note(FALLBACK_NOTE)
            })
            .collect();

        Plan {
            generated_at,
            timezone: timezone.into(),
            items,
        }
    }
}

/// Deterministic plan in output form. Never fails; no eligible tasks means an empty plan.
pub fn fallback_plan(
    tasks: &[Task],
    reference_date: NaiveDate,
    settings: &PlanningSettings,
    now: DateTime<Utc>,
) -> Plan {
    plan_day(tasks, reference_date, settings.workday_hours)
        .into_plan(settings.timezone.clone(), now)
}
