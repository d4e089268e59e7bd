// ABOUTME: Core data models for project sessions, users, status and connectivity warnings

pub mod project;
pub mod session;
pub mod user;
pub mod warning;

pub use project::{LaunchOptions, ProjectConfig, ProjectState, ProjectStatus, Spec, StatusQuery};
pub use session::Session;
pub use user::User;
pub use warning::{ConnectivityWarning, ProjectWarning, CANNOT_CONNECT_BASE_URL_WARNING};
