// ABOUTME: Project controller and the observable application state it publishes

pub mod controller;
pub mod state;

pub use controller::{ControllerConfig, ControllerHandle, ProjectController};
pub use state::{AppState, View};
