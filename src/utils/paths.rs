//! Default file locations
//!
//! Config and the knowledge database both live under `~/.ghostwriter/`.

use std::path::{Path, PathBuf};

use crate::utils::error::{AppError, AppResult};

const APP_DIR: &str = ".ghostwriter";

/// `~/.ghostwriter/`
pub fn ghostwriter_dir() -> AppResult<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(APP_DIR))
        .ok_or_else(|| AppError::config("Could not determine home directory"))
}

/// `~/.ghostwriter/config.json`
pub fn config_path() -> AppResult<PathBuf> {
    Ok(ghostwriter_dir()?.join("config.json"))
}

/// `~/.ghostwriter/knowledge.db`
pub fn database_path() -> AppResult<PathBuf> {
    Ok(ghostwriter_dir()?.join("knowledge.db"))
}

/// Create `path` and any missing parents
pub fn ensure_dir(path: &Path) -> AppResult<()> {
    if !path.is_dir() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
