//! Parsing and validation of AI plan responses.

use chrono::{DateTime, FixedOffset, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;

use crate::error::{PlanningError, PlanningResult};
use crate::plan::{Plan, PlanItem};
use crate::time::parse_iso_datetime;

const DEFAULT_TIMEZONE: &str = "UTC";

/// Longest duration taken from an AI item; anything above is discarded and
/// refilled from the task snapshot.
pub const MAX_ITEM_MINUTES: u32 = 24 * 60;

#[derive(Debug, Deserialize)]
struct WirePlan {
    #[serde(default)]
    plan_generated_at: Option<Value>,
    #[serde(default)]
    timezone: Option<Value>,
    #[serde(default)]
    tasks: Option<Vec<WireItem>>,
}

#[derive(Debug, Deserialize)]
struct WireItem {
    #[serde(default)]
    task_id: Option<Value>,
    #[serde(default)]
    priority_rank: Option<Value>,
    #[serde(default)]
    duration_minutes: Option<Value>,
    #[serde(default)]
    planned_start: Option<Value>,
    #[serde(default)]
    planned_end: Option<Value>,
    #[serde(default)]
    note: Option<Value>,
}

/// Decode `raw` strictly, else retry once on the span from the first `{` to the last `}`.
fn extract_json(raw: &str) -> PlanningResult<Value> {
    match serde_json::from_str::<Value>(raw) {
        Ok(v) => Ok(v),
        Err(first) => {
            let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}')) else {
                return Err(PlanningError::parse(format!("response is not JSON: {first}")));
            };
            if end <= start {
                return Err(PlanningError::parse(format!("response is not JSON: {first}")));
            }
            serde_json::from_str::<Value>(&raw[start..=end])
                .map_err(|e| PlanningError::parse(format!("response is not JSON: {e}")))
        }
    }
}

fn integer_field(item: &WireItem, value: Option<&Value>, field: &str) -> PlanningResult<i64> {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        PlanningError::parse(format!(
            "task entry needs an integer {field}, got {:?} (task_id={:?})",
            value, item.task_id
        ))
    })
}

fn datetime_field(
    value: Option<&Value>,
    field: &str,
) -> PlanningResult<Option<DateTime<FixedOffset>>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => parse_iso_datetime(s)
            .map(Some)
            .ok_or_else(|| PlanningError::parse(format!("invalid datetime in {field}: {s}"))),
        Some(other) => Err(PlanningError::parse(format!("invalid datetime in {field}: {other}"))),
    }
}

fn parse_item(item: &WireItem) -> PlanningResult<PlanItem> {
    let task_id = integer_field(item, item.task_id.as_ref(), "task_id")?;
    let rank = integer_field(item, item.priority_rank.as_ref(), "priority_rank")?;

    // Out-of-range ranks become 0 and are dropped by validation.
    let priority_rank = u32::try_from(rank).unwrap_or(0);

    let duration_minutes = item
        .duration_minutes
        .as_ref()
        .and_then(Value::as_u64)
        .and_then(|m| u32::try_from(m).ok())
        .filter(|m| *m <= MAX_ITEM_MINUTES);

    let note = match &item.note {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    };

    Ok(PlanItem {
        task_id,
        priority_rank,
        duration_minutes,
        planned_start: datetime_field(item.planned_start.as_ref(), "planned_start")?,
        planned_end: datetime_field(item.planned_end.as_ref(), "planned_end")?,
        note,
    })
}

/// Parse the raw AI response text into a plan. Items are kept in response order.
pub fn parse_plan(raw: &str, now: DateTime<Utc>) -> PlanningResult<Plan> {
    debug!(raw_text = raw, "AI raw response");

    let value = extract_json(raw)?;
    if !value.is_object() {
        return Err(PlanningError::parse("response JSON is not an object"));
    }
    let wire: WirePlan = serde_json::from_value(value)
        .map_err(|e| PlanningError::parse(format!("unexpected plan shape: {e}")))?;

    let generated_at = match &wire.plan_generated_at {
        Some(Value::String(s)) => parse_iso_datetime(s)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or(now),
        _ => now,
    };

    let timezone = match &wire.timezone {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        _ => DEFAULT_TIMEZONE.to_string(),
    };

    let items = wire
        .tasks
        .unwrap_or_default()
        .iter()
        .map(parse_item)
        .collect::<PlanningResult<Vec<_>>>()?;

    Ok(Plan {
        generated_at,
        timezone,
        items,
    })
}

/// Cross-check a parsed plan against the task ids it was built from.
///
/// Drops unknown task ids, zero ranks, repeated ranks and repeated task ids
/// (first wins in each case), then sorts by rank. Ranks are not renumbered here.
pub fn validate_plan(mut plan: Plan, known_ids: &HashSet<i64>) -> PlanningResult<Plan> {
    let mut seen_ranks = HashSet::new();
    let mut seen_ids = HashSet::new();
    let before = plan.items.len();

    plan.items.retain(|item| {
        if !known_ids.contains(&item.task_id) {
            debug!(task_id = item.task_id, "dropping AI item with unknown task id");
            return false;
        }
        if item.priority_rank == 0 {
            debug!(task_id = item.task_id, "dropping AI item with non-positive rank");
            return false;
        }
        if seen_ranks.contains(&item.priority_rank) {
            debug!(
                task_id = item.task_id,
                rank = item.priority_rank,
                "dropping AI item with duplicate rank"
            );
            return false;
        }
        if !seen_ids.insert(item.task_id) {
            debug!(task_id = item.task_id, "dropping repeated AI item for the same task");
            return false;
        }
        seen_ranks.insert(item.priority_rank);
        true
    });

    if plan.items.is_empty() {
        return Err(PlanningError::validation(format!(
            "AI plan has no valid tasks ({before} returned)"
        )));
    }

    plan.items.sort_by_key(|i| i.priority_rank);
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 8, 0, 0).unwrap()
    }

    fn known(ids: &[i64]) -> HashSet<i64> {
        ids.iter().copied().collect()
    }

    #[test]
    fn parses_strict_json() {
        let raw = r#"{
            "plan_generated_at": "2026-05-04T07:59:00Z",
            "timezone": "Europe/Kyiv",
            "tasks": [
                {"task_id": 3, "priority_rank": 1, "duration_minutes": 45,
                 "planned_start": "2026-05-04T09:00:00Z", "planned_end": "2026-05-04T09:45:00Z",
                 "note": "focus block"},
                {"task_id": 4, "priority_rank": 2, "duration_minutes": 30,
                 "planned_start": null, "planned_end": null}
            ]
        }"#;
        let plan = parse_plan(raw, now()).unwrap();
        assert_eq!(plan.timezone, "Europe/Kyiv");
        assert_eq!(plan.generated_at, Utc.with_ymd_and_hms(2026, 5, 4, 7, 59, 0).unwrap());
        assert_eq!(plan.items.len(), 2);
        assert_eq!(plan.items[0].note.as_deref(), Some("focus block"));
        assert_eq!(
            plan.items[0].planned_start.unwrap().to_rfc3339(),
            "2026-05-04T09:00:00+00:00"
        );
        assert!(plan.items[1].planned_start.is_none());
        assert!(plan.items[1].note.is_none());
    }

    #[test]
    fn extracts_json_wrapped_in_prose() {
        let raw = "Sure! Here is your plan:\n```json\n{\"tasks\": [{\"task_id\": 1, \"priority_rank\": 1}]}\n```\nGood luck!";
        let plan = parse_plan(raw, now()).unwrap();
        assert_eq!(plan.items.len(), 1);
        assert_eq!(plan.timezone, "UTC");
        assert_eq!(plan.generated_at, now());
    }

    #[test]
    fn non_json_is_parse_error() {
        assert!(matches!(parse_plan("no plan today", now()), Err(PlanningError::Parse(_))));
        assert!(matches!(parse_plan("} oops {", now()), Err(PlanningError::Parse(_))));
        assert!(matches!(parse_plan("[1, 2, 3]", now()), Err(PlanningError::Parse(_))));
    }

    #[test]
    fn bad_generated_at_defaults_to_now() {
        let raw = r#"{"plan_generated_at": "soon", "timezone": null, "tasks": []}"#;
        let plan = parse_plan(raw, now()).unwrap();
        assert_eq!(plan.generated_at, now());
        assert_eq!(plan.timezone, "UTC");
    }

    #[test]
    fn bad_item_datetime_is_parse_error() {
        let raw = r#"{"tasks": [{"task_id": 1, "priority_rank": 1, "planned_start": "after lunch"}]}"#;
        assert!(matches!(parse_plan(raw, now()), Err(PlanningError::Parse(_))));
    }

    #[test]
    fn missing_ids_are_parse_errors() {
        let raw = r#"{"tasks": [{"priority_rank": 1}]}"#;
        assert!(matches!(parse_plan(raw, now()), Err(PlanningError::Parse(_))));
        let raw = r#"{"tasks": [{"task_id": 1, "priority_rank": "first"}]}"#;
        assert!(matches!(parse_plan(raw, now()), Err(PlanningError::Parse(_))));
    }

    #[test]
    fn integer_strings_are_accepted() {
        let raw = r#"{"tasks": [{"task_id": "12", "priority_rank": "1"}]}"#;
        let plan = parse_plan(raw, now()).unwrap();
        assert_eq!(plan.items[0].task_id, 12);
        assert_eq!(plan.items[0].priority_rank, 1);
    }

    #[test]
    fn validation_drops_unknown_and_duplicates_then_sorts() {
        let raw = r#"{"tasks": [
            {"task_id": 2, "priority_rank": 3},
            {"task_id": 99, "priority_rank": 1},
            {"task_id": 1, "priority_rank": 2},
            {"task_id": 3, "priority_rank": 2},
            {"task_id": 3, "priority_rank": 0}
        ]}"#;
        let plan = parse_plan(raw, now()).unwrap();
        let plan = validate_plan(plan, &known(&[1, 2, 3])).unwrap();
        assert_eq!(plan.task_ids(), vec![1, 2]);
        let ranks: Vec<u32> = plan.items.iter().map(|i| i.priority_rank).collect();
        assert_eq!(ranks, vec![2, 3]);
    }

    #[test]
    fn validation_fails_when_nothing_survives() {
        let raw = r#"{"tasks": [{"task_id": 42, "priority_rank": 1}]}"#;
        let plan = parse_plan(raw, now()).unwrap();
        assert!(matches!(
            validate_plan(plan, &known(&[1])),
            Err(PlanningError::Validation(_))
        ));

        let empty = parse_plan(r#"{"tasks": []}"#, now()).unwrap();
        assert!(validate_plan(empty, &known(&[1])).is_err());
    }

    #[test]
    fn same_task_listed_twice_is_kept_once() {
        let raw = r#"{"tasks": [
            {"task_id": 1, "priority_rank": 2},
            {"task_id": 1, "priority_rank": 1},
            {"task_id": 2, "priority_rank": 3}
        ]}"#;
        let plan = validate_plan(parse_plan(raw, now()).unwrap(), &known(&[1, 2])).unwrap();
        assert_eq!(plan.task_ids(), vec![1, 2]);
        assert_eq!(plan.items[0].priority_rank, 2);
    }

    #[test]
    fn implausible_durations_are_discarded() {
        let raw = r#"{"tasks": [
            {"task_id": 1, "priority_rank": 1, "duration_minutes": 4294967295},
            {"task_id": 2, "priority_rank": 2, "duration_minutes": 1440}
        ]}"#;
        let plan = parse_plan(raw, now()).unwrap();
        assert_eq!(plan.items[0].duration_minutes, None);
        assert_eq!(plan.items[1].duration_minutes, Some(MAX_ITEM_MINUTES));
    }
}
