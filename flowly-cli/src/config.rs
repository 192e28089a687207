use anyhow::{Context, Result};
use flowly_core::PlanningSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::state::ensure_flowly_home;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub planning: PlanningSection,
    pub ai: AiSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanningSection {
    pub workday_hours: u32,
    pub long_break_minutes: u32,
    pub short_break_minutes: u32,
    /// IANA zone used to decide what "today" is and passed to the AI.
    pub timezone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiSection {
    pub model: String,
    pub base_url: String,
}

impl Default for PlanningSection {
    fn default() -> Self {
        let s = PlanningSettings::default();
        Self {
            workday_hours: s.workday_hours,
            long_break_minutes: s.long_break_minutes,
            short_break_minutes: s.short_break_minutes,
            timezone: s.timezone,
        }
    }
}

impl Default for AiSection {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
        }
    }
}

impl Config {
    pub fn planning_settings(&self) -> PlanningSettings {
        PlanningSettings {
            workday_hours: self.planning.workday_hours,
            long_break_minutes: self.planning.long_break_minutes,
            short_break_minutes: self.planning.short_break_minutes,
            timezone: self.planning.timezone.clone(),
        }
    }

    /// Apply `GEMINI_MODEL` if it was set to something non-blank.
    pub fn with_model_override(mut self, model: Option<String>) -> Self {
        if let Some(m) = model.map(|m| m.trim().to_string()).filter(|m| !m.is_empty()) {
            self.ai.model = m;
        }
        self
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_flowly_home()?.join("config.toml"))
}

pub fn parse_config(s: &str) -> Result<Config> {
    toml::from_str(s).context("parse config.toml")
}

/// Config file plus environment overrides. A missing file gives defaults.
pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    let cfg = if p.exists() {
        let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
        parse_config(&s)?
    } else {
        Config::default()
    };
    Ok(cfg.with_model_override(std::env::var("GEMINI_MODEL").ok()))
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

/// `models/gemini-2.5-flash` → `gemini-2.5-flash`.
pub fn normalize_gemini_model(model: &str) -> String {
    let model = model.trim();
    model.strip_prefix("models/").unwrap_or(model).to_string()
}
