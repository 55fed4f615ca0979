use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `~/.statements`, or `$STATEMENTS_HOME` when set.
pub fn statements_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("STATEMENTS_HOME") {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".statements"))
}

pub fn ensure_statements_home() -> Result<PathBuf> {
    let dir = statements_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

pub fn browse_log_path() -> Result<PathBuf> {
    Ok(ensure_statements_home()?.join("browse.log"))
}
