// ABOUTME: Project controller running the session lifecycle on a single event loop
// Commands, pushed events and remote results are serialized through one queue and screened for auth expiry

use crate::app::{AppState, View};
use crate::ipc::{ProjectIpc, RemoteResult, Subscription};
use crate::models::{ProjectStatus, ProjectWarning, Session, Spec};
use crate::session::poller::StatusSink;
use crate::session::{
    AuthGuard, ConnectivityWarningManager, RetryAttempt, Screened, SessionError, SessionOpener,
    StatusPoller, STATUS_POLL_INTERVAL,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub poll_interval: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            poll_interval: STATUS_POLL_INTERVAL,
        }
    }
}

type Reply = oneshot::Sender<Result<(), SessionError>>;

enum ControllerEvent {
    Command(Command),
    Notification(Notification),
}

/// Requests coming from the handle
enum Command {
    Start(Reply),
    Reopen(Reply),
    Retry,
    Shutdown(oneshot::Sender<()>),
}

/// Pushed events and resolved remote calls, tagged with the session they belong to
enum Notification {
    ConfigChanged {
        generation: u64,
    },
    ProjectWarning {
        generation: u64,
        warning: RemoteResult<ProjectWarning>,
    },
    StatusResolved {
        generation: u64,
        outcome: RemoteResult<ProjectStatus>,
    },
    SpecsResolved {
        generation: u64,
        outcome: RemoteResult<Vec<Spec>>,
    },
    ProbeResolved {
        attempt: RetryAttempt,
        outcome: RemoteResult<()>,
    },
}

pub struct ProjectController {
    ipc: Arc<dyn ProjectIpc>,
    events: mpsc::UnboundedSender<ControllerEvent>,
    state_tx: watch::Sender<AppState>,
    opener: SessionOpener,
    poller: StatusPoller,
    auth: AuthGuard,
    warnings: ConnectivityWarningManager,
    subscriptions: Vec<Subscription>,
    specs_task: Option<JoinHandle<()>>,
    generation: u64,
    view: View,
    specs: Vec<Spec>,
    status: Option<ProjectStatus>,
}

impl ProjectController {
    /// Spawn the controller loop and return the handle used to drive it
    pub fn spawn(ipc: Arc<dyn ProjectIpc>, config: ControllerConfig) -> ControllerHandle {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(AppState::new());

        let controller = Self {
            opener: SessionOpener::new(ipc.clone()),
            ipc,
            events: events_tx.clone(),
            state_tx,
            poller: StatusPoller::new(config.poll_interval),
            auth: AuthGuard::new(),
            warnings: ConnectivityWarningManager::new(),
            subscriptions: Vec::new(),
            specs_task: None,
            generation: 0,
            view: View::Loading,
            specs: Vec::new(),
            status: None,
        };
        let task = tokio::spawn(controller.run(events_rx));

        ControllerHandle {
            events: events_tx,
            state: state_rx,
            task,
        }
    }

    async fn run(mut self, mut events: mpsc::UnboundedReceiver<ControllerEvent>) {
        info!("Project controller started");

        while let Some(event) = events.recv().await {
            match event {
                ControllerEvent::Command(Command::Shutdown(reply)) => {
                    self.shutdown().await;
                    self.publish();
                    let _ = reply.send(());
                    break;
                }
                ControllerEvent::Command(Command::Start(reply)) => {
                    let result = self.start().await;
                    self.publish();
                    let _ = reply.send(result);
                }
                ControllerEvent::Command(Command::Reopen(reply)) => {
                    let result = self.reopen_session().await;
                    self.publish();
                    let _ = reply.send(result);
                }
                ControllerEvent::Command(Command::Retry) => {
                    self.retry();
                    self.publish();
                }
                ControllerEvent::Notification(notification) => {
                    self.handle(notification).await;
                    self.publish();
                }
            }
        }

        info!("Project controller stopped");
    }

    async fn handle(&mut self, notification: Notification) {
        match notification {
            Notification::ConfigChanged { generation } => {
                // Every notification reopens, even one queued before an earlier reopen
                if !self.opener.is_open() {
                    debug!(
                        "Dropping config change for generation {}, no project is open",
                        generation
                    );
                    return;
                }
                info!("Project config changed, reopening project");
                if let Err(e) = self.reopen_session().await {
                    warn!("Failed to reopen project after config change: {}", e);
                }
            }
            Notification::ProjectWarning {
                generation,
                warning,
            } => {
                let Some(warning) = self.screen_for(generation, "onProjectWarning", warning).await
                else {
                    return;
                };
                match warning {
                    Ok(warning) => self.warnings.raise(warning.message),
                    Err(e) => warn!("Project warning channel reported an error: {}", e),
                }
            }
            Notification::StatusResolved {
                generation,
                outcome,
            } => {
                let Some(outcome) = self.screen_for(generation, "getProjectStatus", outcome).await
                else {
                    return;
                };
                match outcome {
                    Ok(status) => {
                        debug!("Project {} is {}", status.id, status.state.label());
                        self.status = Some(status);
                    }
                    Err(e) => warn!("Project status request failed, polling continues: {}", e),
                }
            }
            Notification::SpecsResolved {
                generation,
                outcome,
            } => {
                let Some(outcome) = self.screen_for(generation, "getSpecs", outcome).await else {
                    return;
                };
                match outcome {
                    Ok(specs) => {
                        info!("Loaded {} specs", specs.len());
                        self.specs = specs;
                    }
                    Err(e) => warn!("Failed to load specs: {}", e),
                }
            }
            Notification::ProbeResolved { attempt, outcome } => {
                match self.auth.screen("pingBaseUrl", outcome) {
                    Screened::Expired => self.log_out().await,
                    Screened::Passed(outcome) => {
                        self.warnings.resolve(attempt, outcome);
                    }
                }
            }
        }
    }

    /// Screen a session-scoped outcome. Returns `None` when the session expired
    /// or the outcome belongs to a session that is no longer current.
    async fn screen_for<T>(
        &mut self,
        generation: u64,
        operation: &str,
        outcome: RemoteResult<T>,
    ) -> Option<RemoteResult<T>> {
        match self.auth.screen(operation, outcome) {
            Screened::Expired => {
                self.log_out().await;
                None
            }
            Screened::Passed(_) if self.is_stale(generation, operation) => None,
            Screened::Passed(outcome) => Some(outcome),
        }
    }

    async fn start(&mut self) -> Result<(), SessionError> {
        self.view = View::Loading;
        self.publish();

        let outcome = self.ipc.get_options().await;
        let options = self.guarded("getOptions", outcome).await?;
        let Some(project_root) = options.project_root else {
            self.view = View::ProjectError(SessionError::NoProjectRoot.to_string());
            return Err(SessionError::NoProjectRoot);
        };

        let outcome = self.ipc.get_current_user().await;
        let Some(user) = self.guarded("getCurrentUser", outcome).await? else {
            info!("No user is logged in");
            self.log_out().await;
            return Ok(());
        };
        self.auth.log_in(user);

        self.open_session(&project_root).await
    }

    async fn open_session(&mut self, project_root: &Path) -> Result<(), SessionError> {
        self.begin_generation();
        let outcome = self
            .opener
            .open(project_root)
            .await
            .map(|session| Some(session.clone()));
        self.finish_open("openProject", project_root, outcome).await
    }

    async fn reopen_session(&mut self) -> Result<(), SessionError> {
        let project_root = self
            .opener
            .current()
            .map(|session| session.project_root.clone())
            .ok_or(SessionError::NoSession)?;

        info!("Reopening project {}", project_root.display());
        self.begin_generation();
        let outcome = self.opener.reopen().await.map(|session| session.cloned());
        self.finish_open("reopenProject", &project_root, outcome).await
    }

    /// Tear down the previous session's tasks and subscribe for the next one.
    /// Subscribing before the open means nothing pushed during the open is lost.
    fn begin_generation(&mut self) {
        self.stop_session_tasks();
        self.generation += 1;
        self.subscribe(self.generation);
    }

    async fn finish_open(
        &mut self,
        operation: &str,
        project_root: &Path,
        outcome: RemoteResult<Option<Session>>,
    ) -> Result<(), SessionError> {
        match self.auth.screen(operation, outcome) {
            Screened::Expired => {
                self.log_out().await;
                Err(SessionError::AuthExpired)
            }
            Screened::Passed(Ok(Some(session))) => {
                self.activate(&session);
                Ok(())
            }
            Screened::Passed(Ok(None)) => {
                self.stop_session_tasks();
                Err(SessionError::NoSession)
            }
            Screened::Passed(Err(source)) => {
                warn!("Failed to open project {}: {}", project_root.display(), source);
                self.stop_session_tasks();
                self.view = View::ProjectError(source.message.clone());
                Err(SessionError::OpenFailed {
                    path: project_root.to_path_buf(),
                    source,
                })
            }
        }
    }

    fn activate(&mut self, session: &Session) {
        let generation = self.generation;

        match session.status_query() {
            Some(query) => {
                let ipc = self.ipc.clone();
                let sink = self.status_sink();
                self.poller.start(generation, query, ipc, sink);
            }
            None => info!("Project has no id yet, not polling its status"),
        }
        self.load_specs(generation);
        self.view = View::ProjectSpecs;
    }

    fn subscribe(&mut self, generation: u64) {
        let events = self.events.clone();
        let config_changed = Subscription::forward(
            "config-changed",
            self.ipc.on_config_changed(),
            move |()| {
                events
                    .send(ControllerEvent::Notification(Notification::ConfigChanged {
                        generation,
                    }))
                    .is_ok()
            },
        );

        let events = self.events.clone();
        let project_warning = Subscription::forward(
            "project-warning",
            self.ipc.on_project_warning(),
            move |warning| {
                events
                    .send(ControllerEvent::Notification(Notification::ProjectWarning {
                        generation,
                        warning,
                    }))
                    .is_ok()
            },
        );

        self.subscriptions = vec![config_changed, project_warning];
    }

    fn status_sink(&self) -> StatusSink {
        let events = self.events.clone();
        Arc::new(move |generation, outcome| {
            let _ = events.send(ControllerEvent::Notification(Notification::StatusResolved {
                generation,
                outcome,
            }));
        })
    }

    fn load_specs(&mut self, generation: u64) {
        let ipc = self.ipc.clone();
        let events = self.events.clone();

        if let Some(task) = self.specs_task.take() {
            task.abort();
        }
        self.specs_task = Some(tokio::spawn(async move {
            let outcome = ipc.get_specs().await;
            let _ = events.send(ControllerEvent::Notification(Notification::SpecsResolved {
                generation,
                outcome,
            }));
        }));
    }

    fn retry(&mut self) {
        if !self.auth.is_logged_in() || !self.opener.is_open() {
            debug!("Ignoring base url retry, no open session");
            return;
        }

        let attempt = self.warnings.begin_retry();
        info!("Retrying base url (attempt #{})", attempt.0);

        let ipc = self.ipc.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let outcome = ipc.ping_base_url().await;
            let _ = events.send(ControllerEvent::Notification(Notification::ProbeResolved {
                attempt,
                outcome,
            }));
        });
    }

    /// Screen a remote outcome, logging out when the session has expired
    async fn guarded<T>(&mut self, operation: &str, outcome: RemoteResult<T>) -> Result<T, SessionError> {
        match self.auth.screen(operation, outcome) {
            Screened::Passed(result) => result.map_err(SessionError::from),
            Screened::Expired => {
                self.log_out().await;
                Err(SessionError::AuthExpired)
            }
        }
    }

    fn is_stale(&self, generation: u64, what: &str) -> bool {
        let stale = generation != self.generation || !self.opener.is_open();
        if stale {
            debug!(
                "Dropping {} for generation {} (current {})",
                what, generation, self.generation
            );
        }
        stale
    }

    fn stop_session_tasks(&mut self) {
        self.poller.stop();
        self.subscriptions.clear();
        if let Some(task) = self.specs_task.take() {
            task.abort();
        }
        self.warnings.clear();
        self.specs.clear();
        self.status = None;
    }

    async fn log_out(&mut self) {
        let already_out = !self.auth.is_logged_in()
            && self.opener.current().is_none()
            && self.view == View::LoggedOut;
        self.auth.log_out();
        if already_out {
            return;
        }

        self.stop_session_tasks();
        self.generation += 1;

        if let Err(e) = self.opener.close().await {
            warn!("Failed to close project while logging out: {}", e);
        }
        self.view = View::LoggedOut;
    }

    async fn shutdown(&mut self) {
        info!("Shutting down project controller");
        self.stop_session_tasks();
        if let Err(e) = self.opener.close().await {
            warn!("Failed to close project during shutdown: {}", e);
        }
    }

    fn publish(&self) {
        let snapshot = AppState {
            view: self.view.clone(),
            user: self.auth.current_user().cloned(),
            session: self.opener.current().cloned(),
            specs: self.specs.clone(),
            status: self.status.clone(),
            warning: self.warnings.current().cloned(),
            generation: self.generation,
        };

        self.state_tx.send_if_modified(|state| {
            if *state == snapshot {
                false
            } else {
                *state = snapshot;
                true
            }
        });
    }
}

/// Handle to a running controller. Dropping it stops the controller loop.
pub struct ControllerHandle {
    events: mpsc::UnboundedSender<ControllerEvent>,
    state: watch::Receiver<AppState>,
    task: JoinHandle<()>,
}

impl ControllerHandle {
    /// Load options and the current user, then open the project
    pub async fn start(&self) -> Result<(), SessionError> {
        self.request(Command::Start).await
    }

    /// Close the open project and open it again
    pub async fn reopen(&self) -> Result<(), SessionError> {
        self.request(Command::Reopen).await
    }

    /// Probe the base URL again; the outcome updates the warning when it resolves
    pub fn retry(&self) -> Result<(), SessionError> {
        self.events
            .send(ControllerEvent::Command(Command::Retry))
            .map_err(|_| SessionError::ControllerStopped)
    }

    pub fn state(&self) -> AppState {
        self.state.borrow().clone()
    }

    pub fn watch_state(&self) -> watch::Receiver<AppState> {
        self.state.clone()
    }

    /// Wait until the published state satisfies `predicate`
    pub async fn wait_for<F>(&self, predicate: F) -> Result<AppState, SessionError>
    where
        F: FnMut(&AppState) -> bool,
    {
        let mut state = self.state.clone();
        let matched = state
            .wait_for(predicate)
            .await
            .map_err(|_| SessionError::ControllerStopped)?;
        Ok(matched.clone())
    }

    /// Close the project and stop the controller loop
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        let (tx, rx) = oneshot::channel();
        self.events
            .send(ControllerEvent::Command(Command::Shutdown(tx)))
            .map_err(|_| SessionError::ControllerStopped)?;
        rx.await.map_err(|_| SessionError::ControllerStopped)
    }

    async fn request(&self, make: fn(Reply) -> Command) -> Result<(), SessionError> {
        let (tx, rx) = oneshot::channel();
        self.events
            .send(ControllerEvent::Command(make(tx)))
            .map_err(|_| SessionError::ControllerStopped)?;
        rx.await.map_err(|_| SessionError::ControllerStopped)?
    }
}

impl Drop for ControllerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
