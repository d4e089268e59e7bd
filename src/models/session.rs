// ABOUTME: Session data model representing the single open project the controller manages

use crate::models::{ProjectConfig, StatusQuery};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub project_root: PathBuf,
    pub project_id: Option<String>,
    pub is_open: bool,
    pub config: ProjectConfig,
    pub opened_at: DateTime<Utc>,
}

impl Session {
    pub fn open(project_root: PathBuf, config: ProjectConfig) -> Self {
        Self {
            project_root,
            project_id: config.project_id.clone(),
            is_open: true,
            config,
            opened_at: Utc::now(),
        }
    }

    pub fn mark_closed(&mut self) {
        self.is_open = false;
    }

    /// Status request for this project, if it has been assigned an id
    pub fn status_query(&self) -> Option<StatusQuery> {
        self.project_id.as_ref().map(|id| StatusQuery {
            id: id.clone(),
            path: self.project_root.clone(),
        })
    }

    /// Configured project name, falling back to the root folder name
    pub fn display_name(&self) -> String {
        match &self.config.project_name {
            Some(name) => name.clone(),
            None => self
                .project_root
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| self.project_root.display().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_query_uses_project_id_and_root() {
        let config = ProjectConfig {
            project_id: Some("abc123".to_string()),
            ..ProjectConfig::default()
        };
        let session = Session::open(PathBuf::from("/foo/bar"), config);

        let query = session.status_query().unwrap();
        assert_eq!(query.id, "abc123");
        assert_eq!(query.path, PathBuf::from("/foo/bar"));
        assert!(session.is_open);
    }

    #[test]
    fn test_display_name_prefers_configured_name() {
        let config = ProjectConfig {
            project_name: Some("Kitchen Sink".to_string()),
            ..ProjectConfig::default()
        };
        let named = Session::open(PathBuf::from("/foo/bar"), config);
        assert_eq!(named.display_name(), "Kitchen Sink");

        let unnamed = Session::open(PathBuf::from("/foo/bar"), ProjectConfig::default());
        assert_eq!(unnamed.display_name(), "bar");
    }

    #[test]
    fn test_unconfigured_project_has_no_status_query() {
        let session = Session::open(PathBuf::from("/foo/bar"), ProjectConfig::default());
        assert!(session.status_query().is_none());
    }
}
