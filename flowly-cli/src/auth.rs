use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::state::ensure_flowly_home;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthState {
    pub gemini_api_key: Option<String>,
}

fn auth_path() -> Result<PathBuf> {
    Ok(ensure_flowly_home()?.join("auth.json"))
}

pub fn load_auth() -> Result<AuthState> {
    let p = auth_path()?;
    if !p.exists() {
        return Ok(AuthState::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_auth(auth: &AuthState) -> Result<()> {
    let p = auth_path()?;
    let s = serde_json::to_string_pretty(auth)?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

/// `GEMINI_API_KEY` wins over the stored key. Blank values count as unset.
pub fn resolve_gemini_key(env_key: Option<String>, auth: &AuthState) -> Option<String> {
    fn non_blank(key: Option<&str>) -> Option<String> {
        key.map(str::trim).filter(|k| !k.is_empty()).map(str::to_string)
    }
    non_blank(env_key.as_deref()).or_else(|| non_blank(auth.gemini_api_key.as_deref()))
}

pub fn gemini_api_key() -> Result<Option<String>> {
    Ok(resolve_gemini_key(std::env::var("GEMINI_API_KEY").ok(), &load_auth()?))
}

fn prompt_secret(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush().ok();
    let mut s = String::new();
    io::stdin().read_line(&mut s)?;
    Ok(s.trim().to_string())
}

pub fn gemini_paste_api_key() -> Result<()> {
    let mut auth = load_auth()?;
    let key = prompt_secret("Paste Gemini API key")?;
    if key.is_empty() || key.contains(char::is_whitespace) {
        bail!("that did not look like an API key");
    }
    auth.gemini_api_key = Some(key);
    save_auth(&auth)?;
    println!("Saved Gemini API key to {}", auth_path()?.display());
    Ok(())
}
