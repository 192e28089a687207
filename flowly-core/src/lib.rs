//! flowly-core: the daily planning engine.
//!
//! Filter → rank → allocate for the rule-based plan, plus the AI-assisted
//! path and the orchestrator that falls back between them.

pub mod ai;
pub mod allocator;
pub mod error;
pub mod filter;
pub mod orchestrator;
pub mod plan;
pub mod planner;
pub mod ranking;
pub mod settings;
pub mod summary;
pub mod task;
pub mod time;

pub use ai::{AI_REQUEST_TIMEOUT, PlanService, build_plan_prompt, parse_plan, validate_plan};
pub use allocator::{Allocation, Capacity, allocate};
pub use error::{PlanningError, PlanningResult};
pub use filter::{eligible_tasks, is_eligible};
pub use orchestrator::{PlanOutcome, PlanSource, PlanningOrchestrator};
pub use plan::{Plan, PlanItem};
pub use planner::{DayPlan, FALLBACK_NOTE, fallback_plan, plan_day, plan_eligible};
pub use ranking::{RankKey, Urgency, rank_tasks};
pub use settings::PlanningSettings;
pub use summary::{PlanSummary, REPORTING_CAPACITY_MINUTES};
pub use task::{DEFAULT_DURATION_MINUTES, Priority, Status, Task};
