use thiserror::Error;

/// Failure kinds of a planning invocation.
///
/// Only `Configuration` is fatal. Every other kind is absorbed by the
/// orchestrator, which logs it and switches to the deterministic planner.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlanningError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("AI transport error: {0}")]
    Transport(String),
    #[error("AI response parse error: {0}")]
    Parse(String),
    #[error("AI plan validation error: {0}")]
    Validation(String),
}

pub type PlanningResult<T> = Result<T, PlanningError>;

impl PlanningError {
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }
    pub fn transport<S: Into<String>>(msg: S) -> Self {
        Self::Transport(msg.into())
    }
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        Self::Parse(msg.into())
    }
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    pub fn triggers_fallback(&self) -> bool {
        !matches!(self, PlanningError::Configuration(_))
    }
}
