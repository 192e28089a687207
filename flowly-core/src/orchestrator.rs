//! Planning orchestrator: AI path first, deterministic planner on any failure.
//!
//! States:
//! - `AttemptAi`: build prompt, call the service, parse, validate
//! - `Fallback`: rule-based plan
//!
//! Both end in a finalized plan: timestamp set to the orchestrator's clock,
//! ranks renumbered to `1..=N`, missing durations filled from the snapshot.

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

use crate::ai::{PlanService, build_plan_prompt, parse_plan, validate_plan};
use crate::error::{PlanningError, PlanningResult};
use crate::filter::eligible_tasks;
use crate::plan::Plan;
use crate::planner::plan_eligible;
use crate::settings::PlanningSettings;
use crate::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanSource {
    Ai,
    Fallback,
    /// Nothing eligible; no AI call was made.
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanOutcome {
    pub plan: Plan,
    pub source: PlanSource,
    /// Why the AI path was abandoned, when it was.
    pub fallback_reason: Option<PlanningError>,
    /// Task that alone exceeds the usable day (fallback path only).
    pub overflow: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct PlanningOrchestrator<S: PlanService> {
    service: S,
    settings: PlanningSettings,
}

impl<S: PlanService> PlanningOrchestrator<S> {
    /// Fails only when the settings are out of range.
    pub fn new(service: S, settings: PlanningSettings) -> PlanningResult<Self> {
        settings.validate()?;
        Ok(Self { service, settings })
    }

    pub fn settings(&self) -> &PlanningSettings {
        &self.settings
    }

    /// Produce today's plan. Never fails.
    pub fn plan(
        &self,
        tasks: &[Task],
        reference_date: NaiveDate,
        now: DateTime<Utc>,
    ) -> PlanOutcome {
        let eligible = eligible_tasks(tasks, reference_date);
        if eligible.is_empty() {
            info!(%reference_date, "no eligible tasks; skipping AI planning");
            return PlanOutcome {
                plan: Plan::empty(now, self.settings.timezone.clone()),
                source: PlanSource::Empty,
                fallback_reason: None,
                overflow: None,
            };
        }

        match self.attempt_ai(&eligible, now) {
            Ok(plan) => {
                info!(items = plan.len(), "AI plan accepted");
                PlanOutcome {
                    plan: finalize(plan, &eligible, now),
                    source: PlanSource::Ai,
                    fallback_reason: None,
                    overflow: None,
                }
            }
            Err(err) => {
                warn!(error = %err, "AI planning failed, using fallback");
                let day =
                    plan_eligible(eligible.clone(), reference_date, self.settings.workday_hours);
                let overflow = day.overflow;
                let plan = day.into_plan(self.settings.timezone.clone(), now);
                PlanOutcome {
                    plan: finalize(plan, &eligible, now),
                    source: PlanSource::Fallback,
                    fallback_reason: Some(err),
                    overflow,
                }
            }
        }
    }

    fn attempt_ai(&self, eligible: &[&Task], now: DateTime<Utc>) -> PlanningResult<Plan> {
        let prompt = build_plan_prompt(eligible.iter().copied(), &self.settings)?;
        let raw = self.service.complete(&prompt)?;
        let plan = parse_plan(&raw, now)?;
        let known: HashSet<i64> = eligible.iter().map(|t| t.id).collect();
        validate_plan(plan, &known)
    }
}

fn finalize(mut plan: Plan, snapshot: &[&Task], now: DateTime<Utc>) -> Plan {
    let durations: HashMap<i64, u32> = snapshot
        .iter()
        .map(|t| (t.id, t.normalized_duration()))
        .collect();

    for item in plan.items.iter_mut() {
        if item.duration_minutes.is_none() {
            item.duration_minutes = durations.get(&item.task_id).copied();
        }
    }

    plan.renumber();
    plan.generated_at = now;
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::FALLBACK_NOTE;
    use chrono::TimeZone;

    #[derive(Debug)]
    struct Canned(PlanningResult<String>);

    impl PlanService for Canned {
        fn complete(&self, _prompt: &str) -> PlanningResult<String> {
            self.0.clone()
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 4).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 6, 0, 0).unwrap()
    }

    fn tasks() -> Vec<Task> {
        vec![
            Task::new(1, "one").with_duration(60),
            Task::new(2, "two").with_duration(20),
        ]
    }

    #[test]
    fn ai_plan_is_finalized() {
        let raw = r#"{"plan_generated_at": "2020-01-01T00:00:00Z", "timezone": "UTC",
            "tasks": [{"task_id": 1, "priority_rank": 4}, {"task_id": 2, "priority_rank": 9, "duration_minutes": 25}]}"#;
        let o = PlanningOrchestrator::new(Canned(Ok(raw.to_string())), PlanningSettings::default())
            .unwrap();
        let out = o.plan(&tasks(), today(), now());

        assert_eq!(out.source, PlanSource::Ai);
        assert_eq!(out.plan.generated_at, now());
        assert_eq!(out.plan.task_ids(), vec![1, 2]);
        assert!(out.plan.has_contiguous_ranks());
        assert_eq!(out.plan.items[0].duration_minutes, Some(60));
        assert_eq!(out.plan.items[1].duration_minutes, Some(25));
    }

    #[test]
    fn transport_error_falls_back() {
        let o = PlanningOrchestrator::new(
            Canned(Err(PlanningError::transport("timed out"))),
            PlanningSettings::default(),
        )
        .unwrap();
        let out = o.plan(&tasks(), today(), now());

        assert_eq!(out.source, PlanSource::Fallback);
        assert_eq!(out.fallback_reason, Some(PlanningError::transport("timed out")));
        assert_eq!(out.plan.task_ids(), vec![2, 1]);
        assert!(out.plan.items.iter().all(|i| i.note.as_deref() == Some(FALLBACK_NOTE)));
    }

    #[test]
    fn empty_snapshot_skips_ai() {
        struct Unreachable;
        impl PlanService for Unreachable {
            fn complete(&self, _prompt: &str) -> PlanningResult<String> {
                panic!("AI must not be called without eligible tasks");
            }
        }

        let o = PlanningOrchestrator::new(Unreachable, PlanningSettings::default()).unwrap();
        let blocked = vec![Task::new(1, "blocked").blocked()];
        let out = o.plan(&blocked, today(), now());
        assert_eq!(out.source, PlanSource::Empty);
        assert!(out.plan.is_empty());
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let settings = PlanningSettings {
            workday_hours: 20,
            ..PlanningSettings::default()
        };
        let err = PlanningOrchestrator::new(Canned(Ok(String::new())), settings).unwrap_err();
        assert!(matches!(err, PlanningError::Configuration(_)));
    }
}
