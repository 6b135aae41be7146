use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub fn shuxin_home() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".shuxin"))
}

pub fn ensure_shuxin_home() -> Result<PathBuf> {
    let dir = shuxin_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

/// Default location of the rolling diagnostic log. Without a home directory
/// the logs go under the system temp dir.
pub fn default_log_dir(home: Option<&Path>) -> PathBuf {
    match home {
        Some(home) => home.join("logs"),
        None => std::env::temp_dir().join("shuxin").join("logs"),
    }
}
