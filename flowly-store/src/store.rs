//! JSON-file task store.
//!
//! Layout under the store directory:
//! - `tasks.json`: `{ "next_id": N, "tasks": [StoredTask...] }`
//! - `plan.json`: the last generated [`Plan`]
//!
//! Every write goes to a sibling temp file first and is renamed into place,
//! so a reader sees either the old file or the new one.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use flowly_core::{Plan, PlanItem, Task};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::record::{NewTask, StoredTask, TaskPatch};
use crate::status::CanonicalStatus;

/// Storage seam the planner reads from and writes plans to.
pub trait TaskStore {
    /// Tasks that are neither completed nor cancelled, as engine tasks.
    fn fetch_plannable_tasks(&self) -> Result<Vec<Task>>;

    /// Discard the previous plan and persist `plan` in its place.
    fn replace_plan(&self, plan: &Plan) -> Result<()>;

    /// Last persisted plan joined with its tasks, if any.
    fn read_plan(&self) -> Result<Option<StoredPlan>>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedTask {
    pub item: PlanItem,
    pub task: StoredTask,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredPlan {
    pub generated_at: DateTime<Utc>,
    pub timezone: String,
    /// Rank order. Items whose task has since been deleted are left out.
    pub items: Vec<PlannedTask>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TaskFile {
    next_id: i64,
    tasks: Vec<StoredTask>,
}

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn tasks_path(&self) -> PathBuf {
        self.dir.join("tasks.json")
    }

    fn plan_path(&self) -> PathBuf {
        self.dir.join("plan.json")
    }

    fn load_tasks(&self) -> Result<TaskFile> {
        let p = self.tasks_path();
        if !p.exists() {
            return Ok(TaskFile {
                next_id: 1,
                tasks: Vec::new(),
            });
        }
        let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
        serde_json::from_str(&s).with_context(|| format!("parse {}", p.display()))
    }

    fn save_tasks(&self, file: &TaskFile) -> Result<()> {
        let json = serde_json::to_string_pretty(file)?;
        write_atomic(&self.tasks_path(), &json)
    }

    pub fn create_task(&self, new: NewTask, now: DateTime<Utc>) -> Result<StoredTask> {
        if new.title.trim().is_empty() {
            bail!("task title must not be empty");
        }
        if let Some(p) = new.priority {
            check_priority(p)?;
        }
        let mut file = self.load_tasks()?;
        let id = file.next_id.max(1);
        file.next_id = id + 1;

        let task = StoredTask {
            id,
            title: new.title,
            description: new.description,
            priority: new.priority,
            duration_minutes: new.duration_minutes,
            deadline: new.deadline,
            status: new
                .status
                .unwrap_or(CanonicalStatus::Pending)
                .to_stored()
                .to_string(),
            start_date: new.start_date,
            tags: new.tags,
            is_blocked: new.is_blocked,
            is_pinned: new.is_pinned,
            created_at: now,
            updated_at: now,
        };
        file.tasks.push(task.clone());
        self.save_tasks(&file)?;
        info!(task_id = id, "task created");
        Ok(task)
    }

    pub fn get_task(&self, id: i64) -> Result<Option<StoredTask>> {
        Ok(self.load_tasks()?.tasks.into_iter().find(|t| t.id == id))
    }

    /// Tasks in creation order, paged.
    pub fn list_tasks(&self, skip: usize, limit: usize) -> Result<Vec<StoredTask>> {
        let mut tasks = self.load_tasks()?.tasks;
        tasks.sort_by_key(|t| (t.created_at, t.id));
        Ok(tasks.into_iter().skip(skip).take(limit).collect())
    }

    pub fn update_task(
        &self,
        id: i64,
        patch: &TaskPatch,
        now: DateTime<Utc>,
    ) -> Result<Option<StoredTask>> {
        let mut file = self.load_tasks()?;
        let Some(task) = file.tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };
        task.apply_patch(patch, now);
        if let Some(p) = task.priority {
            check_priority(p)?;
        }
        if task.title.trim().is_empty() {
            bail!("task title must not be empty");
        }
        let updated = task.clone();
        self.save_tasks(&file)?;
        info!(task_id = id, "task updated");
        Ok(Some(updated))
    }

    /// Returns whether a task was removed.
    pub fn delete_task(&self, id: i64) -> Result<bool> {
        let mut file = self.load_tasks()?;
        let before = file.tasks.len();
        file.tasks.retain(|t| t.id != id);
        if file.tasks.len() == before {
            return Ok(false);
        }
        self.save_tasks(&file)?;
        info!(task_id = id, "task deleted");
        Ok(true)
    }
}

impl TaskStore for JsonFileStore {
    fn fetch_plannable_tasks(&self) -> Result<Vec<Task>> {
        let tasks: Vec<Task> = self
            .load_tasks()?
            .tasks
            .iter()
            .filter(|t| t.is_plannable())
            .filter_map(StoredTask::to_engine_task)
            .collect();
        debug!(count = tasks.len(), "fetched plannable tasks");
        Ok(tasks)
    }

    fn replace_plan(&self, plan: &Plan) -> Result<()> {
        let json = serde_json::to_string_pretty(plan)?;
        write_atomic(&self.plan_path(), &json)?;
        info!(items = plan.len(), "plan replaced");
        Ok(())
    }

    fn read_plan(&self) -> Result<Option<StoredPlan>> {
        let p = self.plan_path();
        if !p.exists() {
            return Ok(None);
        }
        let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
        let plan: Plan =
            serde_json::from_str(&s).with_context(|| format!("parse {}", p.display()))?;
        let tasks = self.load_tasks()?.tasks;

        let mut items: Vec<PlannedTask> = plan
            .items
            .into_iter()
            .filter_map(|item| {
                let task = tasks.iter().find(|t| t.id == item.task_id)?.clone();
                Some(PlannedTask { item, task })
            })
            .collect();
        items.sort_by_key(|p| p.item.priority_rank);

        Ok(Some(StoredPlan {
            generated_at: plan.generated_at,
            timezone: plan.timezone,
            items,
        }))
    }
}

fn check_priority(p: u8) -> Result<()> {
    if !(1..=5).contains(&p) {
        bail!("priority must be between 1 and 5 (got {p})");
    }
    Ok(())
}

/// Each call writes its own temp file beside `path`, so concurrent writers
/// never share one; the last rename wins.
fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let dir = path
        .parent()
        .with_context(|| format!("{} has no parent directory", path.display()))?;
    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("create temp file in {}", dir.display()))?;
    tmp.write_all(contents.as_bytes())
        .with_context(|| format!("write {}", tmp.path().display()))?;
    tmp.persist(path).with_context(|| format!("replace {}", path.display()))?;
    Ok(())
}
