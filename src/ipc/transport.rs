// ABOUTME: ProjectIpc trait describing every call and event the session controller consumes

use crate::ipc::RemoteResult;
use crate::models::{LaunchOptions, ProjectConfig, ProjectStatus, ProjectWarning, Spec, StatusQuery, User};
use async_trait::async_trait;
use std::path::Path;
use tokio::sync::broadcast;

/// Remote calls and pushed notifications provided by the host process.
///
/// Every method returns a `RemoteResult`; the controller screens each
/// outcome for an expired session before acting on it. Event methods hand
/// out a fresh receiver per call, so each open session gets its own
/// subscription that can be dropped on teardown.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProjectIpc: Send + Sync {
    async fn get_options(&self) -> RemoteResult<LaunchOptions>;

    async fn get_current_user(&self) -> RemoteResult<Option<User>>;

    async fn open_project(&self, project_root: &Path) -> RemoteResult<ProjectConfig>;

    async fn get_specs(&self) -> RemoteResult<Vec<Spec>>;

    async fn close_project(&self) -> RemoteResult<()>;

    async fn get_project_status(&self, query: &StatusQuery) -> RemoteResult<ProjectStatus>;

    async fn ping_base_url(&self) -> RemoteResult<()>;

    /// Fires whenever the project's configuration changes on disk
    fn on_config_changed(&self) -> broadcast::Receiver<()>;

    fn on_project_warning(&self) -> broadcast::Receiver<RemoteResult<ProjectWarning>>;
}
