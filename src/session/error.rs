// ABOUTME: Error types surfaced by session operations and the controller handle

use crate::ipc::RemoteError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error("No project root was provided")]
    NoProjectRoot,
    #[error("No project is open")]
    NoSession,
    #[error("Failed to open project {}: {source}", path.display())]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: RemoteError,
    },
    #[error("Session expired, user has been logged out")]
    AuthExpired,
    #[error("Remote call failed: {0}")]
    Remote(#[from] RemoteError),
    #[error("Project controller has stopped")]
    ControllerStopped,
}
