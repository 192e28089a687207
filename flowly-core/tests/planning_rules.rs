use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use flowly_core::{PlanSummary, PlanningSettings, Priority, Status, Task, fallback_plan, plan_day};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 16, 7, 0, 0).unwrap()
}

/// Lower ids were created later.
fn task(id: i64, title: &str, priority: Priority, minutes: u32) -> Task {
    Task::new(id, title)
        .with_priority(priority)
        .with_duration(minutes)
        .with_created_at(now() - Duration::days(id))
}

fn ids(tasks: &[&Task]) -> Vec<i64> {
    tasks.iter().map(|t| t.id).collect()
}

#[test]
fn filtered_tasks_never_appear() {
    let tasks = vec![
        task(1, "done", Priority::High, 30).with_status(Status::Done),
        task(2, "blocked", Priority::High, 30).blocked(),
        task(3, "future", Priority::High, 30).with_start_date(today() + Duration::days(1)),
        task(4, "someday", Priority::High, 30).with_tag("someday"),
        task(5, "on hold", Priority::High, 30).with_tag("on_hold"),
        task(6, "plain", Priority::Low, 30),
    ];
    let plan = plan_day(&tasks, today(), 8);
    assert_eq!(ids(&plan.tasks), vec![6]);
}

#[test]
fn pinned_tasks_rank_before_all_others() {
    let tasks = vec![
        task(1, "urgent high", Priority::High, 30).with_deadline(today()),
        task(2, "pinned low", Priority::Low, 120).pinned(),
        task(3, "overdue high", Priority::High, 10).with_deadline(today() - Duration::days(3)),
        task(4, "pinned medium", Priority::Medium, 60).pinned(),
    ];
    let plan = plan_day(&tasks, today(), 8);
    let order = ids(&plan.tasks);
    let last_pinned = order.iter().rposition(|id| *id == 2 || *id == 4).unwrap();
    let first_other = order.iter().position(|id| *id == 1 || *id == 3).unwrap();
    assert!(last_pinned < first_other);
    assert_eq!(order, vec![4, 2, 3, 1]);
}

#[test]
fn priorities_with_the_same_deadline() {
    let tomorrow = today() + Duration::days(1);
    let tasks = vec![
        task(1, "low", Priority::Low, 30).with_deadline(tomorrow),
        task(2, "high", Priority::High, 30).with_deadline(tomorrow),
        task(3, "medium", Priority::Medium, 30).with_deadline(tomorrow),
    ];
    let plan = plan_day(&tasks, today(), 8);
    let priorities: Vec<Priority> = plan.tasks.iter().map(|t| t.priority).collect();
    assert_eq!(priorities, vec![Priority::High, Priority::Medium, Priority::Low]);
}

#[test]
fn any_deadline_beats_no_deadline() {
    for deadline in [today() - Duration::days(1), today(), today() + Duration::days(1)] {
        let tasks = vec![
            task(1, "no deadline", Priority::High, 30),
            task(2, "deadline", Priority::High, 30).with_deadline(deadline),
        ];
        let plan = plan_day(&tasks, today(), 8);
        assert_eq!(ids(&plan.tasks), vec![2, 1], "deadline {deadline}");
    }
}

#[test]
fn multiple_deadlines_before_no_deadline() {
    let tasks = vec![
        task(1, "none", Priority::High, 30),
        task(2, "today", Priority::High, 30).with_deadline(today()),
        task(3, "tomorrow", Priority::High, 30).with_deadline(today() + Duration::days(1)),
    ];
    let plan = plan_day(&tasks, today(), 8);
    assert_eq!(ids(&plan.tasks), vec![2, 3, 1]);
}

#[test]
fn capacity_is_never_exceeded() {
    let tasks: Vec<Task> = (1..=4)
        .map(|i| task(i, "block", Priority::High, 150))
        .collect();
    let plan = plan_day(&tasks, today(), 8);
    let summary = PlanSummary::of_tasks(&plan.tasks);
    assert_eq!(plan.tasks.len(), 2);
    assert_eq!(summary.total_minutes, 300);
    assert!(summary.total_minutes <= 432);
}

#[test]
fn exact_capacity_fits() {
    let tasks = vec![
        task(1, "half", Priority::Medium, 216),
        task(2, "half", Priority::Medium, 216),
    ];
    let plan = plan_day(&tasks, today(), 8);
    let summary = PlanSummary::of_tasks(&plan.tasks);
    assert_eq!(plan.tasks.len(), 2);
    assert_eq!(summary.total_minutes, 432);
    assert_eq!(summary.capacity_used_percent, 100.0);
}

#[test]
fn gap_filling_skips_the_big_task() {
    // Four 100-minute tasks fill 400 of 432 minutes; the 400-minute one no longer fits.
    let created = now();
    let tasks: Vec<Task> = [100, 400, 100, 100, 100]
        .iter()
        .enumerate()
        .map(|(i, m)| {
            Task::new(i as i64 + 1, "t")
                .with_priority(Priority::High)
                .with_duration(*m)
                .with_created_at(created + Duration::minutes(i as i64))
        })
        .collect();

    let plan = plan_day(&tasks, today(), 8);
    assert_eq!(plan.tasks.len(), 4);
    assert!(!ids(&plan.tasks).contains(&2));
    assert_eq!(PlanSummary::of_tasks(&plan.tasks).total_minutes, 400);
}

#[test]
fn capacity_forces_priority_trade_off() {
    let tasks = vec![
        task(1, "high 1", Priority::High, 200),
        task(2, "high 2", Priority::High, 200),
        task(3, "high 3", Priority::High, 200),
        task(4, "medium", Priority::Medium, 50),
    ];
    let plan = plan_day(&tasks, today(), 8);
    assert_eq!(plan.tasks.len(), 2);
    assert!(plan.tasks.iter().all(|t| t.priority == Priority::High));
}

#[test]
fn oversized_task_signals_overflow() {
    let tasks = vec![
        task(1, "short", Priority::High, 30),
        task(2, "whole day", Priority::Medium, 600),
        task(3, "after", Priority::Low, 15),
    ];
    let plan = plan_day(&tasks, today(), 8);
    assert_eq!(ids(&plan.tasks), vec![1, 2]);
    assert_eq!(plan.overflow, Some(2));
}

#[test]
fn fallback_is_deterministic() {
    let tasks = vec![
        task(5, "e", Priority::Low, 45).with_deadline(today()),
        task(1, "a", Priority::High, 90),
        task(3, "c", Priority::Medium, 30).pinned(),
        task(2, "b", Priority::High, 90).with_deadline(today() + Duration::days(4)),
        task(4, "d", Priority::Medium, 200),
    ];
    let settings = PlanningSettings::default();
    let first = fallback_plan(&tasks, today(), &settings, now());

    let mut reversed = tasks.clone();
    reversed.reverse();
    for _ in 0..5 {
        assert_eq!(fallback_plan(&tasks, today(), &settings, now()), first);
        assert_eq!(fallback_plan(&reversed, today(), &settings, now()), first);
    }
    assert!(first.has_contiguous_ranks());
}

#[test]
fn summary_is_idempotent() {
    let tasks = vec![
        task(1, "a", Priority::High, 95),
        task(2, "b", Priority::Medium, 40),
    ];
    let plan = fallback_plan(&tasks, today(), &PlanningSettings::default(), now());
    let once = PlanSummary::of(&plan);
    let twice = PlanSummary::of(&plan);
    assert_eq!(once, twice);
    assert_eq!(once.total_minutes, 135);
    assert_eq!(once.total_hours, 2.3);
    assert_eq!(once.capacity_used_percent, 31.3);
}
