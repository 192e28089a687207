//! AI-assisted planning: prompt construction, response parsing and validation.
//!
//! The transport itself lives outside the engine behind [`PlanService`].

pub mod request;
pub mod response;

use std::time::Duration;

use crate::error::PlanningResult;

pub use request::build_plan_prompt;
pub use response::{parse_plan, validate_plan};

/// Upper bound for a single AI call.
pub const AI_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Single-turn text completion used by the AI planning path.
///
/// Implementations map network failures, timeouts and non-success statuses
/// to `PlanningError::Transport`.
pub trait PlanService: Send + Sync {
    fn complete(&self, prompt: &str) -> PlanningResult<String>;
}

impl<S: PlanService + ?Sized> PlanService for &S {
    fn complete(&self, prompt: &str) -> PlanningResult<String> {
        (**self).complete(prompt)
    }
}

impl<S: PlanService + ?Sized> PlanService for Box<S> {
    fn complete(&self, prompt: &str) -> PlanningResult<String> {
        (**self).complete(prompt)
    }
}
