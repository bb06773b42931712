//! Configuration File
//!
//! The active [`AppConfig`] lives in a pretty-printed JSON file. Its location
//! is, in order: an explicit path, `$GHOSTWRITER_CONFIG`, then
//! `~/.ghostwriter/config.json`. A missing file is created with defaults.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::models::settings::{AppConfig, SettingsUpdate};
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::{config_path, ensure_dir};

/// Environment variable overriding the default config location
pub const CONFIG_ENV_VAR: &str = "GHOSTWRITER_CONFIG";

/// Validated configuration bound to its backing file
#[derive(Debug)]
pub struct ConfigService {
    config_path: PathBuf,
    config: AppConfig,
}

impl ConfigService {
    /// Open (or create) the config at `path`
    pub fn open(path: impl Into<PathBuf>) -> AppResult<Self> {
        let config_path = path.into();
        if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            ensure_dir(parent)?;
        }

        let config = if config_path.exists() {
            let config = read_config(&config_path)?;
            debug!(path = %config_path.display(), "loaded configuration");
            config
        } else {
            let config = AppConfig::default();
            write_config(&config_path, &config)?;
            info!(path = %config_path.display(), "wrote default configuration");
            config
        };

        Ok(Self {
            config_path,
            config,
        })
    }

    pub fn get_config(&self) -> &AppConfig {
        &self.config
    }

    pub fn get_config_clone(&self) -> AppConfig {
        self.config.clone()
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Apply a partial update and persist it.
    ///
    /// Validation happens before anything is written; a rejected update
    /// leaves memory and disk untouched.
    pub fn update_config(&mut self, update: SettingsUpdate) -> AppResult<AppConfig> {
        let mut candidate = self.config.clone();
        candidate.apply_update(update);
        write_config(&self.config_path, &candidate)?;
        self.config = candidate;
        Ok(self.config.clone())
    }
}

/// Pick the config file location: explicit path, then env override, then home
pub fn resolve_path(explicit: Option<PathBuf>, env_override: Option<OsString>) -> AppResult<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path);
    }
    match env_override.filter(|v| !v.is_empty()) {
        Some(value) => Ok(PathBuf::from(value)),
        None => config_path(),
    }
}

fn read_config(path: &Path) -> AppResult<AppConfig> {
    let content = fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&content)?;
    config.validate().map_err(AppError::validation)?;
    Ok(config)
}

// Written to a sibling temp file first so a crash never leaves half a config
fn write_config(path: &Path, config: &AppConfig) -> AppResult<()> {
    config.validate().map_err(AppError::validation)?;
    let content = serde_json::to_string_pretty(config)?;
    let staging = path.with_extension("json.tmp");
    fs::write(&staging, content)?;
    fs::rename(&staging, path)?;
    Ok(())
}
