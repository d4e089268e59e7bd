// ABOUTME: Project-level data exchanged with the host: launch options, config, status and specs

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default folder, relative to the project root, that holds spec files
pub const DEFAULT_SPEC_FOLDER: &str = "specs";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchOptions {
    pub project_root: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectConfig {
    pub project_id: Option<String>,
    pub project_name: Option<String>,
    pub base_url: Option<String>,
    pub spec_folder: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            project_name: None,
            base_url: None,
            spec_folder: DEFAULT_SPEC_FOLDER.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusQuery {
    pub id: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectState {
    Valid,
    Invalid,
    Unauthorized,
    #[serde(other)]
    Unknown,
}

impl ProjectState {
    pub fn label(&self) -> &'static str {
        match self {
            ProjectState::Valid => "valid",
            ProjectState::Invalid => "invalid",
            ProjectState::Unauthorized => "unauthorized",
            ProjectState::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectStatus {
    pub id: String,
    pub state: ProjectState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spec {
    pub name: String,
    pub relative: String,
    pub absolute: PathBuf,
}
