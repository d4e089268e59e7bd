// ABOUTME: Session opener that opens, closes and reopens the single project session
// Only one session may be open at a time; opening closes whatever is still open

use crate::ipc::{ProjectIpc, RemoteResult};
use crate::models::Session;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

pub struct SessionOpener {
    ipc: Arc<dyn ProjectIpc>,
    session: Option<Session>,
}

impl SessionOpener {
    pub fn new(ipc: Arc<dyn ProjectIpc>) -> Self {
        Self { ipc, session: None }
    }

    pub fn current(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.is_open)
    }

    /// Open the project at `project_root`. Failures are returned as-is, there is no retry.
    pub async fn open(&mut self, project_root: &Path) -> RemoteResult<&Session> {
        if self.session.is_some() {
            self.close().await?;
        }

        info!("Opening project {}", project_root.display());
        let config = self.ipc.open_project(project_root).await?;
        let session = Session::open(project_root.to_path_buf(), config);
        info!(
            "Opened project {} at {} (id: {})",
            session.display_name(),
            project_root.display(),
            session.project_id.as_deref().unwrap_or("none")
        );

        Ok(&*self.session.insert(session))
    }

    /// Close the open session. The local session is dropped even when the remote close fails.
    pub async fn close(&mut self) -> RemoteResult<Option<Session>> {
        let Some(mut session) = self.session.take() else {
            return Ok(None);
        };

        info!("Closing project {}", session.project_root.display());
        session.mark_closed();

        match self.ipc.close_project().await {
            Ok(()) => Ok(Some(session)),
            Err(e) if e.is_unauthorized() => Err(e),
            Err(e) => {
                warn!("Failed to close project {}: {}", session.project_root.display(), e);
                Ok(Some(session))
            }
        }
    }

    /// Close the current session and open the same project root again.
    /// Returns `Ok(None)` when there is no session to reopen.
    pub async fn reopen(&mut self) -> RemoteResult<Option<&Session>> {
        let Some(project_root) = self.session.as_ref().map(|s| s.project_root.clone()) else {
            return Ok(None);
        };

        self.close().await?;
        self.open(&project_root).await.map(Some)
    }
}
