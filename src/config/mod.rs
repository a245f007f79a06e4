//! Configuration for ccsettings itself.
//!
//! The file is optional. Every key overrides one default location:
//!
//! ```toml
//! # ~/.ccsettings/config.toml
//! claude_home = "~/.claude"
//! claude_json = "~/.claude.json"
//! managed_settings = "/etc/claude-code/managed-settings.json"
//! presets_file = "~/.ccsettings/presets.json"
//! ```
//!
//! **Location:**
//! - Unix/macOS: `~/.ccsettings/config.toml`
//! - Windows: `%LOCALAPPDATA%\ccsettings\config.toml`
//! - Override: `--config <path>` or `CCSETTINGS_CONFIG`
//!
//! Values are tilde and environment expanded.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::constants::{APP_DIR, CLAUDE_DIR, CLAUDE_JSON_FILE};
use crate::core::SettingsError;
use crate::store::StorePaths;
use crate::utils::{expand_path, home_dir};

/// Name of the presets file inside the application directory.
const PRESETS_FILE: &str = "presets.json";

/// Contents of `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Claude Code home directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claude_home: Option<String>,

    /// Global Claude Code state file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claude_json: Option<String>,

    /// Managed settings file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub managed_settings: Option<String>,

    /// Where presets are kept
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presets_file: Option<String>,
}

impl AppConfig {
    /// Load from `path`, or from [`default_path`](Self::default_path) when
    /// `None`. A missing file yields the defaults.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => Self::default_path()?,
        };
        if path.exists() {
            Self::load_from(&path).await
        } else {
            debug!("No config file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&content).map_err(|e| {
            SettingsError::ConfigError {
                message: format!("{}: {e}", path.display()),
            }
            .into()
        })
    }

    /// Platform location of the config file.
    pub fn default_path() -> Result<PathBuf> {
        Ok(app_dir()?.join("config.toml"))
    }

    /// Resolved locations for the filesystem store.
    pub fn store_paths(&self) -> Result<StorePaths> {
        let home = home_dir()?;
        Ok(StorePaths {
            claude_home: resolve(self.claude_home.as_deref(), || Ok(home.join(CLAUDE_DIR)))?,
            claude_json: resolve(self.claude_json.as_deref(), || Ok(home.join(CLAUDE_JSON_FILE)))?,
            managed_settings: match self.managed_settings.as_deref() {
                Some(raw) => Some(expand_path(raw)?),
                None => default_managed_settings_path(),
            },
        })
    }

    /// Resolved location of the presets file.
    pub fn presets_path(&self) -> Result<PathBuf> {
        resolve(self.presets_file.as_deref(), || Ok(app_dir()?.join(PRESETS_FILE)))
    }
}

fn resolve(raw: Option<&str>, default: impl FnOnce() -> Result<PathBuf>) -> Result<PathBuf> {
    match raw {
        Some(raw) => expand_path(raw),
        None => default(),
    }
}

fn app_dir() -> Result<PathBuf> {
    if cfg!(target_os = "windows") {
        Ok(dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
            .join("ccsettings"))
    } else {
        Ok(home_dir()?.join(APP_DIR))
    }
}

/// Where Claude Code reads administrator-managed settings on this platform.
#[must_use]
pub fn default_managed_settings_path() -> Option<PathBuf> {
    if cfg!(target_os = "macos") {
        Some(PathBuf::from("/Library/Application Support/ClaudeCode/managed-settings.json"))
    } else if cfg!(target_os = "windows") {
        Some(PathBuf::from(r"C:\ProgramData\ClaudeCode\managed-settings.json"))
    } else if cfg!(unix) {
        Some(PathBuf::from("/etc/claude-code/managed-settings.json"))
    } else {
        None
    }
}
