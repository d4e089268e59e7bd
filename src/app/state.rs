// ABOUTME: Application state snapshot published by the controller for a presentation layer

use crate::models::{ConnectivityWarning, ProjectStatus, Session, Spec, User};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Loading,
    ProjectSpecs,
    LoggedOut,
    ProjectError(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppState {
    pub view: View,
    pub user: Option<User>,
    pub session: Option<Session>,
    pub specs: Vec<Spec>,
    pub status: Option<ProjectStatus>,
    pub warning: Option<ConnectivityWarning>,
    /// Bumped every time a session is opened or torn down by logout
    pub generation: u64,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_on_project_specs(&self) -> bool {
        self.view == View::ProjectSpecs
    }

    pub fn is_logged_out(&self) -> bool {
        self.view == View::LoggedOut
    }

    pub fn warning_visible(&self) -> bool {
        self.warning.as_ref().is_some_and(|w| w.raised)
    }

    /// One-line summary used by the command-line presenter
    pub fn summary(&self) -> String {
        let view = match &self.view {
            View::Loading => "loading".to_string(),
            View::ProjectSpecs => "project specs".to_string(),
            View::LoggedOut => "logged out".to_string(),
            View::ProjectError(message) => format!("error: {message}"),
        };

        let mut parts = vec![format!("view: {view}")];
        if let Some(session) = &self.session {
            parts.push(format!("project: {}", session.project_root.display()));
            parts.push(format!("specs: {}", self.specs.len()));
        }
        if let Some(status) = &self.status {
            parts.push(format!("status: {}", status.state.label()));
        }
        if let Some(warning) = self.warning.as_ref().filter(|w| w.raised) {
            let suffix = if warning.retrying { " (retrying)" } else { "" };
            parts.push(format!("warning: {}{}", warning.message, suffix));
        }
        parts.join(" | ")
    }
}
