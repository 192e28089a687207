//! flowly-store: task persistence for the planner.
//!
//! Stored rows keep their legacy status spelling; everything handed to the
//! engine goes through [`status::CanonicalStatus`] first.

pub mod record;
pub mod status;
pub mod store;

pub use record::{NewTask, StoredTask, TaskPatch, engine_priority};
pub use status::CanonicalStatus;
pub use store::{JsonFileStore, PlannedTask, StoredPlan, TaskStore};
