// ABOUTME: Application configuration loaded from ~/.project-session/config.toml
// Every field has a default so a missing file or partial file is fine

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_DIR: &str = ".project-session";
const CONFIG_FILE: &str = "config.toml";
const USER_FILE: &str = "user.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Dashboard API used for project status requests
    pub api_url: Option<String>,
    /// JSON file holding the logged-in user; defaults to ~/.project-session/user.json
    pub user_file: Option<PathBuf>,
    /// Window over which a burst of project.json change events counts as one change
    pub watch_debounce_ms: u64,
    /// Timeout applied to dashboard requests and base URL probes
    pub request_timeout_ms: u64,
    /// Fallback tracing filter when RUST_LOG is not set
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            user_file: None,
            watch_debounce_ms: 100,
            request_timeout_ms: 5000,
            log_filter: "project_session=info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load from the default location, falling back to defaults when absent
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::data_dir().join(CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn data_dir() -> PathBuf {
        dirs::home_dir()
            .map(|home| home.join(APP_DIR))
            .unwrap_or_else(|| PathBuf::from(APP_DIR))
    }

    pub fn logs_dir() -> PathBuf {
        Self::data_dir().join("logs")
    }

    pub fn user_file_path(&self) -> PathBuf {
        self.user_file
            .clone()
            .unwrap_or_else(|| Self::data_dir().join(USER_FILE))
    }
}
