// ABOUTME: Scripted fake of the host IPC used by the controller integration tests
// Records every call and lets tests settle status and probe outcomes whenever they choose

#![allow(dead_code)]

use async_trait::async_trait;
use project_session::ipc::{ProjectIpc, RemoteError, RemoteResult};
use project_session::models::{
    LaunchOptions, ProjectConfig, ProjectState, ProjectStatus, ProjectWarning, Spec, StatusQuery,
    User,
};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, watch};

pub const PROJECT_ROOT: &str = "/foo/bar";
pub const PROJECT_ID: &str = "ypt4pf";

/// Outcome that can be settled later; every waiter sees the same value
pub struct Deferred<T> {
    tx: Arc<watch::Sender<Option<T>>>,
}

impl<T> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T: Clone> Deferred<T> {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    pub fn resolve(&self, value: T) {
        self.tx.send_replace(Some(value));
    }

    pub async fn wait(&self) -> T {
        let mut rx = self.tx.subscribe();
        let value = rx
            .wait_for(Option::is_some)
            .await
            .expect("deferred sender dropped");
        value.clone().expect("deferred value present")
    }
}

pub enum Respond<T> {
    Now(T),
    Later(Deferred<T>),
}

impl<T: Clone> Respond<T> {
    async fn get(&self) -> T {
        match self {
            Respond::Now(value) => value.clone(),
            Respond::Later(deferred) => deferred.wait().await,
        }
    }
}

impl<T> Clone for Respond<T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        match self {
            Respond::Now(value) => Respond::Now(value.clone()),
            Respond::Later(deferred) => Respond::Later(deferred.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    GetOptions,
    GetCurrentUser,
    OpenProject(PathBuf),
    GetSpecs,
    CloseProject,
    GetProjectStatus(StatusQuery),
    PingBaseUrl,
}

pub struct FakeIpc {
    options: LaunchOptions,
    user: Mutex<Option<User>>,
    open_results: Mutex<VecDeque<RemoteResult<ProjectConfig>>>,
    default_config: ProjectConfig,
    specs: Vec<Spec>,
    status: Mutex<Respond<RemoteResult<ProjectStatus>>>,
    pings: Mutex<VecDeque<Respond<RemoteResult<()>>>>,
    calls: Mutex<Vec<Call>>,
    calls_tx: watch::Sender<usize>,
    config_tx: broadcast::Sender<()>,
    warning_tx: broadcast::Sender<RemoteResult<ProjectWarning>>,
}

impl FakeIpc {
    /// Logged-in user, project `/foo/bar` with an id, status left pending
    pub fn new() -> Self {
        let (calls_tx, _) = watch::channel(0);
        let (config_tx, _) = broadcast::channel(16);
        let (warning_tx, _) = broadcast::channel(16);

        Self {
            options: LaunchOptions {
                project_root: Some(PathBuf::from(PROJECT_ROOT)),
            },
            user: Mutex::new(Some(user())),
            open_results: Mutex::new(VecDeque::new()),
            default_config: config(),
            specs: specs(),
            status: Mutex::new(Respond::Later(Deferred::new())),
            pings: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            calls_tx,
            config_tx,
            warning_tx,
        }
    }

    pub fn without_user(self) -> Self {
        *self.user.lock().unwrap() = None;
        self
    }

    pub fn with_config(mut self, config: ProjectConfig) -> Self {
        self.default_config = config;
        self
    }

    pub fn with_status(self, status: Respond<RemoteResult<ProjectStatus>>) -> Self {
        *self.status.lock().unwrap() = status;
        self
    }

    /// Queue the outcome of the next `open_project` call
    pub fn push_open_result(&self, result: RemoteResult<ProjectConfig>) {
        self.open_results.lock().unwrap().push_back(result);
    }

    /// Queue the outcome of the next `ping_base_url` call; unqueued pings succeed
    pub fn push_ping(&self, respond: Respond<RemoteResult<()>>) {
        self.pings.lock().unwrap().push_back(respond);
    }

    pub fn set_status(&self, status: Respond<RemoteResult<ProjectStatus>>) {
        *self.status.lock().unwrap() = status;
    }

    pub fn emit_config_changed(&self) {
        self.config_tx.send(()).expect("controller is subscribed");
    }

    pub fn emit_warning(&self, warning: RemoteResult<ProjectWarning>) {
        self.warning_tx.send(warning).expect("controller is subscribed");
    }

    pub fn subscriber_count(&self) -> usize {
        self.config_tx.receiver_count()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| predicate(c)).count()
    }

    pub fn open_calls(&self) -> usize {
        self.count(|c| matches!(c, Call::OpenProject(_)))
    }

    pub fn close_calls(&self) -> usize {
        self.count(|c| matches!(c, Call::CloseProject))
    }

    pub fn status_calls(&self) -> usize {
        self.count(|c| matches!(c, Call::GetProjectStatus(_)))
    }

    pub fn ping_calls(&self) -> usize {
        self.count(|c| matches!(c, Call::PingBaseUrl))
    }

    /// Wait until the recorded calls satisfy `predicate`
    pub async fn wait_for_calls(&self, predicate: impl Fn(&FakeIpc) -> bool) {
        let mut rx = self.calls_tx.subscribe();
        rx.wait_for(|_| predicate(self))
            .await
            .expect("call counter dropped");
    }

    fn record(&self, call: Call) {
        let total = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(call);
            calls.len()
        };
        self.calls_tx.send_replace(total);
    }
}

#[async_trait]
impl ProjectIpc for FakeIpc {
    async fn get_options(&self) -> RemoteResult<LaunchOptions> {
        self.record(Call::GetOptions);
        Ok(self.options.clone())
    }

    async fn get_current_user(&self) -> RemoteResult<Option<User>> {
        self.record(Call::GetCurrentUser);
        Ok(self.user.lock().unwrap().clone())
    }

    async fn open_project(&self, project_root: &Path) -> RemoteResult<ProjectConfig> {
        self.record(Call::OpenProject(project_root.to_path_buf()));
        let queued = self.open_results.lock().unwrap().pop_front();
        queued.unwrap_or_else(|| Ok(self.default_config.clone()))
    }

    async fn get_specs(&self) -> RemoteResult<Vec<Spec>> {
        self.record(Call::GetSpecs);
        Ok(self.specs.clone())
    }

    async fn close_project(&self) -> RemoteResult<()> {
        self.record(Call::CloseProject);
        Ok(())
    }

    async fn get_project_status(&self, query: &StatusQuery) -> RemoteResult<ProjectStatus> {
        self.record(Call::GetProjectStatus(query.clone()));
        let respond = self.status.lock().unwrap().clone();
        respond.get().await
    }

    async fn ping_base_url(&self) -> RemoteResult<()> {
        self.record(Call::PingBaseUrl);
        let respond = self.pings.lock().unwrap().pop_front();
        match respond {
            Some(respond) => respond.get().await,
            None => Ok(()),
        }
    }

    fn on_config_changed(&self) -> broadcast::Receiver<()> {
        self.config_tx.subscribe()
    }

    fn on_project_warning(&self) -> broadcast::Receiver<RemoteResult<ProjectWarning>> {
        self.warning_tx.subscribe()
    }
}

pub fn user() -> User {
    User {
        name: "Jane Lane".to_string(),
        email: "jane@example.com".to_string(),
        auth_token: "1111-2222-3333-4444".to_string(),
    }
}

pub fn config() -> ProjectConfig {
    ProjectConfig {
        project_id: Some(PROJECT_ID.to_string()),
        project_name: Some("bar".to_string()),
        base_url: Some("http://localhost:8080".to_string()),
        ..ProjectConfig::default()
    }
}

pub fn specs() -> Vec<Spec> {
    ["app_spec.js", "account/login_spec.js"]
        .iter()
        .map(|relative| Spec {
            name: relative.rsplit('/').next().unwrap_or(relative).to_string(),
            relative: relative.to_string(),
            absolute: Path::new(PROJECT_ROOT).join("specs").join(relative),
        })
        .collect()
}

pub fn valid_status() -> ProjectStatus {
    ProjectStatus {
        id: PROJECT_ID.to_string(),
        state: ProjectState::Valid,
    }
}

pub fn base_url_warning() -> ProjectWarning {
    ProjectWarning::cannot_connect_base_url("http://localhost:8080", "connection refused")
}

pub fn unreachable() -> RemoteError {
    RemoteError::new("Cannot connect to base url http://localhost:8080")
}

pub fn status_query() -> StatusQuery {
    StatusQuery {
        id: PROJECT_ID.to_string(),
        path: PathBuf::from(PROJECT_ROOT),
    }
}

/// Let spawned tasks run without letting a paused clock move
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

/// Fail the test instead of hanging when an expected event never arrives
pub async fn within<F: std::future::Future>(future: F) -> F::Output {
    tokio::time::timeout(std::time::Duration::from_secs(5), future)
        .await
        .expect("timed out waiting for the controller")
}
