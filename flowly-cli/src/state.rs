use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$FLOWLY_HOME`, else `~/.flowly`.
pub fn flowly_home() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os("FLOWLY_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".flowly"))
}

pub fn ensure_flowly_home() -> Result<PathBuf> {
    let dir = flowly_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

/// Directory holding `tasks.json` and `plan.json`.
pub fn store_dir() -> Result<PathBuf> {
    Ok(ensure_flowly_home()?.join("data"))
}
