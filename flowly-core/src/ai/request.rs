//! Prompt builder for the AI planning path.

use serde::Serialize;

use crate::allocator::Capacity;
use crate::error::{PlanningError, PlanningResult};
use crate::settings::PlanningSettings;
use crate::task::{Priority, Status, Task};

#[derive(Debug, Serialize)]
struct PromptTask<'a> {
    id: i64,
    title: &'a str,
    description: &'a str,
    priority: Priority,
    duration_minutes: u32,
    deadline: Option<String>,
    status: Status,
    is_blocked: bool,
    is_pinned: bool,
    tags: &'a [String],
    start_date: Option<String>,
}

impl<'a> From<&'a Task> for PromptTask<'a> {
    fn from(task: &'a Task) -> Self {
        Self {
            id: task.id,
            title: &task.title,
            description: task.description.as_deref().unwrap_or(""),
            priority: task.priority,
            duration_minutes: task.normalized_duration(),
            deadline: task.deadline.map(|d| d.format("%Y-%m-%d").to_string()),
            status: task.status,
            is_blocked: task.is_blocked,
            is_pinned: task.is_pinned,
            tags: &task.tags,
            start_date: task.start_date.map(|d| d.format("%Y-%m-%d").to_string()),
        }
    }
}

const RULES: &str = "\
Rules (apply in this order):
1. Pinned tasks come first, before everything else.
2. Tasks whose deadline is today or already passed come next, then tasks with a future deadline, then tasks with no deadline.
3. Within the same group: priority high > medium > low.
4. Then shorter duration first.
5. Then older tasks first.
Never schedule blocked tasks. Never split a task. Keep the total duration, including breaks, within the usable minutes of the day.
Add a short note only when it is useful.";

const OUTPUT_SCHEMA: &str = r#"{
  "plan_generated_at": "<ISO datetime>",
  "timezone": "<string>",
  "tasks": [
    {
      "task_id": <int>,
      "priority_rank": <int starting at 1>,
      "duration_minutes": <int>,
      "planned_start": "<ISO datetime or null>",
      "planned_end": "<ISO datetime or null>",
      "note": "<optional string>"
    }
  ]
}"#;

/// Compose the deterministic planning prompt for `tasks`.
pub fn build_plan_prompt<'a>(
    tasks: impl IntoIterator<Item = &'a Task>,
    settings: &PlanningSettings,
) -> PlanningResult<String> {
    let dump: Vec<PromptTask<'_>> = tasks.into_iter().map(PromptTask::from).collect();
    let tasks_json = serde_json::to_string_pretty(&dump)
        .map_err(|e| PlanningError::parse(format!("serialize tasks for prompt: {e}")))?;

    let capacity = Capacity::for_workday(settings.workday_hours);

    Ok(format!(
        "You are an expert time-management assistant. Build an optimized plan for one workday using good timeboxing.\n\
Timezone: {tz}. Workday hours: {hours}. Usable minutes after a 10% buffer: {usable}. Long break: {long} minutes. Short break: {short} minutes.\n\
{RULES}\n\
Use only task ids from the input. Every priority_rank must be unique.\n\
Input tasks JSON:\n\
{tasks_json}\n\n\
Return ONLY a JSON object in this exact schema. No markdown, no code fences, no text before or after it:\n\
{OUTPUT_SCHEMA}",
        tz = settings.timezone,
        hours = settings.workday_hours,
        usable = capacity.effective_minutes,
        long = settings.long_break_minutes,
        short = settings.short_break_minutes,
    ))
}
