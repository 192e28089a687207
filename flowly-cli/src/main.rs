use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use flowly_core::time::{parse_iso_datetime, today_in};
use flowly_core::{
    DEFAULT_DURATION_MINUTES, Plan, PlanSource, PlanSummary, PlanningOrchestrator,
    PlanningSettings, REPORTING_CAPACITY_MINUTES, Task, plan_day,
};
use flowly_store::{
    CanonicalStatus, JsonFileStore, NewTask, StoredPlan, StoredTask, TaskPatch, TaskStore,
};
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod auth;
mod config;
mod gemini;
mod state;

use gemini::GeminiClient;

#[derive(Parser, Debug)]
#[command(
    name = "flowly",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("FLOWLY_BUILD_SHA"), ")"),
    about = "Daily task planner"
)]
struct Cli {
    /// Debug logging (overrides FLOWLY_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a default ~/.flowly/config.toml
    Init,

    /// Store credentials for the AI planner
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },

    /// Manage tasks
    Task {
        #[command(subcommand)]
        command: TaskCommand,
    },

    /// Generate today's plan and replace the stored one
    Plan {
        /// Skip the AI call and use the rule-based planner
        #[arg(long)]
        rules_only: bool,

        #[arg(long)]
        workday_hours: Option<u32>,

        /// IANA timezone, e.g. Europe/Kyiv
        #[arg(long)]
        timezone: Option<String>,

        /// Plan for this date instead of today (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Print the last generated plan
    ShowPlan,
}

#[derive(Subcommand, Debug)]
enum AuthCommand {
    /// Paste a Gemini API key into ~/.flowly/auth.json
    PasteGeminiKey,
}

#[derive(Subcommand, Debug)]
enum TaskCommand {
    Add {
        title: String,
        #[arg(long)]
        description: Option<String>,
        /// 1 (highest) to 5 (lowest)
        #[arg(long)]
        priority: Option<u8>,
        /// Minutes; defaults to 30 when planning
        #[arg(long)]
        duration: Option<u32>,
        /// YYYY-MM-DD or an ISO datetime
        #[arg(long)]
        deadline: Option<String>,
        /// Not eligible before this date
        #[arg(long)]
        start_date: Option<NaiveDate>,
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long)]
        blocked: bool,
        #[arg(long)]
        pinned: bool,
    },

    List {
        #[arg(long, default_value_t = 0)]
        skip: usize,
        #[arg(long, default_value_t = 100)]
        limit: usize,
    },

    Show {
        id: i64,
    },

    Update {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        priority: Option<u8>,
        #[arg(long)]
        duration: Option<u32>,
        #[arg(long, conflicts_with = "clear_deadline")]
        deadline: Option<String>,
        #[arg(long)]
        clear_deadline: bool,
        /// pending | in_progress | completed | cancelled (todo/done accepted)
        #[arg(long)]
        status: Option<CanonicalStatus>,
        #[arg(long)]
        start_date: Option<NaiveDate>,
        /// Replaces all tags
        #[arg(long = "tag")]
        tags: Option<Vec<String>>,
        #[arg(long)]
        blocked: Option<bool>,
        #[arg(long)]
        pinned: Option<bool>,
    },

    Delete {
        id: i64,
    },
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Init => {
            config::init_config()?;
        }

        Command::Auth { command } => match command {
            AuthCommand::PasteGeminiKey => auth::gemini_paste_api_key()?,
        },

        Command::Task { command } => run_task(command)?,

        Command::Plan {
            rules_only,
            workday_hours,
            timezone,
            date,
        } => run_plan(rules_only, workday_hours, timezone, date)?,

        Command::ShowPlan => {
            let store = open_store()?;
            match store.read_plan()? {
                Some(plan) => print_plan(&plan, None),
                None => println!("No plan yet. Run: flowly plan"),
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("FLOWLY_LOG").unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn open_store() -> Result<JsonFileStore> {
    JsonFileStore::open(state::store_dir()?)
}

/// Date-only values land at midnight UTC; the planner only looks at the date.
fn parse_deadline(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(d) = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
        return Ok(d.and_time(chrono::NaiveTime::MIN).and_utc());
    }
    parse_iso_datetime(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("invalid deadline: {raw} (expected YYYY-MM-DD or ISO datetime)"))
}

fn run_task(command: TaskCommand) -> Result<()> {
    let store = open_store()?;
    let now = Utc::now();

    match command {
        TaskCommand::Add {
            title,
            description,
            priority,
            duration,
            deadline,
            start_date,
            tags,
            blocked,
            pinned,
        } => {
            let task = store.create_task(
                NewTask {
                    title,
                    description,
                    priority,
                    duration_minutes: duration,
                    deadline: deadline.as_deref().map(parse_deadline).transpose()?,
                    status: None,
                    start_date,
                    tags,
                    is_blocked: blocked,
                    is_pinned: pinned,
                },
                now,
            )?;
            println!("Created task #{}", task.id);
        }

        TaskCommand::List { skip, limit } => {
            let tasks = store.list_tasks(skip, limit)?;
            if tasks.is_empty() {
                println!("No tasks.");
            }
            for t in &tasks {
                println!("{}", task_line(t));
            }
        }

        TaskCommand::Show { id } => {
            let Some(t) = store.get_task(id)? else {
                bail!("task #{id} not found");
            };
            println!("{}", serde_json::to_string_pretty(&t)?);
        }

        TaskCommand::Update {
            id,
            title,
            description,
            priority,
            duration,
            deadline,
            clear_deadline,
            status,
            start_date,
            tags,
            blocked,
            pinned,
        } => {
            let mut patch = TaskPatch::new();
            if let Some(v) = title {
                patch = patch.title(v);
            }
            if let Some(v) = description {
                patch = patch.description(Some(v));
            }
            if let Some(v) = priority {
                patch = patch.priority(Some(v));
            }
            if let Some(v) = duration {
                patch = patch.duration_minutes(Some(v));
            }
            if clear_deadline {
                patch = patch.deadline(None);
            } else if let Some(v) = deadline {
                patch = patch.deadline(Some(parse_deadline(&v)?));
            }
            if let Some(v) = status {
                patch = patch.status(v);
            }
            if let Some(v) = start_date {
                patch = patch.start_date(Some(v));
            }
            if let Some(v) = tags {
                patch = patch.tags(v);
            }
            if let Some(v) = blocked {
                patch = patch.blocked(v);
            }
            if let Some(v) = pinned {
                patch = patch.pinned(v);
            }
            if patch.is_empty() {
                bail!("nothing to update");
            }
            let Some(t) = store.update_task(id, &patch, now)? else {
                bail!("task #{id} not found");
            };
            println!("{}", task_line(&t));
        }

        TaskCommand::Delete { id } => {
            if !store.delete_task(id)? {
                bail!("task #{id} not found");
            }
            println!("Deleted task #{id}");
        }
    }

    Ok(())
}

fn task_line(t: &StoredTask) -> String {
    let mut line = format!(
        "#{:<4} [{}] p{} {:>4}m  {}",
        t.id,
        t.canonical_status().as_str(),
        t.priority.map(|p| p.to_string()).unwrap_or_else(|| "-".into()),
        t.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES),
        t.title
    );
    if let Some(d) = t.deadline {
        line.push_str(&format!("  due {}", d.date_naive()));
    }
    if t.is_pinned {
        line.push_str("  pinned");
    }
    if t.is_blocked {
        line.push_str("  blocked");
    }
    if !t.tags.is_empty() {
        line.push_str(&format!("  #{}", t.tags.join(" #")));
    }
    line
}

fn run_plan(
    rules_only: bool,
    workday_hours: Option<u32>,
    timezone: Option<String>,
    date: Option<NaiveDate>,
) -> Result<()> {
    let cfg = config::load_config()?;
    let mut settings = cfg.planning_settings();
    if let Some(h) = workday_hours {
        settings.workday_hours = h;
    }
    if let Some(tz) = timezone {
        settings.timezone = tz;
    }
    settings.validate()?;

    let now = Utc::now();
    let today = date.unwrap_or_else(|| today_in(&settings.timezone, now));
    let store = open_store()?;
    let tasks = store.fetch_plannable_tasks()?;

    let plan = if rules_only {
        let (plan, overflow) = rules_only_plan(&tasks, today, &settings, now);
        println!("Planned with rules only.");
        if let Some(id) = overflow {
            println!("Task #{id} alone does not fit in the workday.");
        }
        plan
    } else {
        let client = GeminiClient::new(auth::gemini_api_key()?, &cfg.ai.model, &cfg.ai.base_url)?;
        let orchestrator = PlanningOrchestrator::new(client, settings.clone())?;
        let outcome = orchestrator.plan(&tasks, today, now);
        match (&outcome.source, &outcome.fallback_reason) {
            (PlanSource::Fallback, Some(reason)) => {
                warn!(%reason, "AI planning failed");
                println!("AI plan unavailable ({reason}); used rule-based order.");
            }
            (PlanSource::Ai, _) => println!("Planned with AI."),
            _ => {}
        }
        if let Some(id) = outcome.overflow {
            println!("Task #{id} alone does not fit in the workday.");
        }
        outcome.plan
    };

    store.replace_plan(&plan)?;
    match store.read_plan()? {
        Some(stored) => print_plan(&stored, Some(settings.workday_hours)),
        None => println!("Nothing to plan for {today}."),
    }
    Ok(())
}

/// Rule-based plan plus the task that alone overflows the day, if any.
fn rules_only_plan(
    tasks: &[Task],
    today: NaiveDate,
    settings: &PlanningSettings,
    now: DateTime<Utc>,
) -> (Plan, Option<i64>) {
    let day = plan_day(tasks, today, settings.workday_hours);
    let overflow = day.overflow;
    (day.into_plan(settings.timezone.clone(), now), overflow)
}

fn print_plan(stored: &StoredPlan, workday_hours: Option<u32>) {
    println!(
        "Plan generated {} ({})\n",
        stored.generated_at.format("%Y-%m-%d %H:%M UTC"),
        stored.timezone
    );
    if stored.items.is_empty() {
        println!("Nothing eligible today.");
    }
    for p in &stored.items {
        let mut line = format!(
            "{:>2}. {} ({}m)",
            p.item.priority_rank,
            p.task.title,
            p.item.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES)
        );
        if let (Some(start), Some(end)) = (p.item.planned_start, p.item.planned_end) {
            line.push_str(&format!("  {}-{}", start.format("%H:%M"), end.format("%H:%M")));
        }
        if let Some(note) = &p.item.note {
            line.push_str(&format!("  {note}"));
        }
        println!("{line}");
    }

    let plan = Plan {
        generated_at: stored.generated_at,
        timezone: stored.timezone.clone(),
        items: stored.items.iter().map(|p| p.item.clone()).collect(),
    };
    let s = PlanSummary::of(&plan);
    println!(
        "\n{} tasks, {} min ({} h), {}% of capacity",
        s.total_tasks, s.total_minutes, s.total_hours, s.capacity_used_percent
    );
    if workday_hours.is_some_and(|h| h != 8) {
        println!(
            "(capacity is reported against an 8h day: {} usable minutes)",
            REPORTING_CAPACITY_MINUTES
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn plan_flags_parse() {
        let cli = Cli::try_parse_from([
            "flowly",
            "plan",
            "--rules-only",
            "--workday-hours",
            "6",
            "--date",
            "2026-10-16",
        ])
        .unwrap();
        match cli.command {
            Command::Plan {
                rules_only,
                workday_hours,
                date,
                ..
            } => {
                assert!(rules_only);
                assert_eq!(workday_hours, Some(6));
                assert_eq!(date, NaiveDate::from_ymd_opt(2026, 10, 16));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn update_accepts_legacy_status() {
        let cli =
            Cli::try_parse_from(["flowly", "task", "update", "3", "--status", "done"]).unwrap();
        match cli.command {
            Command::Task {
                command: TaskCommand::Update { status, .. },
            } => assert_eq!(status, Some(CanonicalStatus::Completed)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rules_only_reports_overflow() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let tasks = vec![
            Task::new(1, "short").with_duration(30),
            Task::new(2, "whole day").with_duration(600),
        ];
        let (plan, overflow) =
            rules_only_plan(&tasks, today, &PlanningSettings::default(), Utc::now());
        assert_eq!(overflow, Some(2));
        assert_eq!(plan.task_ids(), vec![1, 2]);
    }

    #[test]
    fn deadlines() {
        let d = parse_deadline("2026-10-20").unwrap();
        assert_eq!(d.date_naive(), NaiveDate::from_ymd_opt(2026, 10, 20).unwrap());
        let d = parse_deadline("2026-10-20T23:30:00+03:00").unwrap();
        assert_eq!(d.date_naive(), NaiveDate::from_ymd_opt(2026, 10, 20).unwrap());
        assert!(parse_deadline("next week").is_err());
    }
}
