//! Per-invocation planning settings.

use serde::{Deserialize, Serialize};

use crate::error::{PlanningError, PlanningResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanningSettings {
    pub workday_hours: u32,
    pub long_break_minutes: u32,
    pub short_break_minutes: u32,
    /// Passed through as-is; the engine does not check it against a tz database.
    pub timezone: String,
}

impl Default for PlanningSettings {
    fn default() -> Self {
        Self {
            workday_hours: 8,
            long_break_minutes: 60,
            short_break_minutes: 15,
            timezone: "UTC".to_string(),
        }
    }
}

impl PlanningSettings {
    pub fn validate(&self) -> PlanningResult<()> {
        check_range("workday_hours", self.workday_hours, 1, 16)?;
        check_range("long_break_minutes", self.long_break_minutes, 0, 180)?;
        check_range("short_break_minutes", self.short_break_minutes, 0, 60)?;
        Ok(())
    }
}

fn check_range(field: &str, value: u32, min: u32, max: u32) -> PlanningResult<()> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(PlanningError::configuration(format!(
            "{field} must be in {min}..={max}, got {value}"
        )))
    }
}
