// ABOUTME: Filesystem and HTTP backed ProjectIpc used by the command-line front-end
// Reads project.json, watches it with notify, and talks to the dashboard API with reqwest

use crate::config::AppConfig;
use crate::ipc::{ProjectIpc, RemoteError, RemoteResult};
use crate::models::warning::CANNOT_CONNECT_BASE_URL_WARNING;
use crate::models::{
    LaunchOptions, ProjectConfig, ProjectStatus, ProjectWarning, Spec, StatusQuery, User,
};
use async_trait::async_trait;
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Project configuration file looked up in the project root
pub const PROJECT_CONFIG_FILE: &str = "project.json";

const SPEC_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx", "coffee", "cjsx"];
const EVENT_BUFFER: usize = 16;

pub struct LocalIpc {
    options: LaunchOptions,
    api_url: Option<String>,
    user_file: PathBuf,
    watch_debounce: Duration,
    http: reqwest::Client,
    opened: Mutex<Option<OpenedProject>>,
    config_tx: broadcast::Sender<()>,
    warning_tx: broadcast::Sender<RemoteResult<ProjectWarning>>,
}

struct OpenedProject {
    root: PathBuf,
    config: ProjectConfig,
    _watcher: Option<ConfigWatcher>,
}

/// Filesystem watcher on the project root and the task that debounces its events
struct ConfigWatcher {
    _watcher: RecommendedWatcher,
    forwarder: JoinHandle<()>,
}

impl Drop for ConfigWatcher {
    fn drop(&mut self) {
        self.forwarder.abort();
    }
}

impl LocalIpc {
    pub fn new(options: LaunchOptions, config: &AppConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;
        let (config_tx, _) = broadcast::channel(EVENT_BUFFER);
        let (warning_tx, _) = broadcast::channel(EVENT_BUFFER);

        Ok(Self {
            options,
            api_url: config.api_url.clone(),
            user_file: config.user_file_path(),
            watch_debounce: Duration::from_millis(config.watch_debounce_ms),
            http,
            opened: Mutex::new(None),
            config_tx,
            warning_tx,
        })
    }

    fn opened_project(&self) -> RemoteResult<(PathBuf, ProjectConfig)> {
        let guard = self
            .opened
            .lock()
            .map_err(|_| RemoteError::new("Project state is unavailable"))?;
        guard
            .as_ref()
            .map(|project| (project.root.clone(), project.config.clone()))
            .ok_or_else(|| RemoteError::new("No project is open"))
    }

    fn watch_config(&self, project_root: &Path) -> notify::Result<ConfigWatcher> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) if touches_project_config(&event) => {
                let _ = tx.send(());
            }
            Ok(_) => {}
            Err(e) => warn!("Project config watcher error: {}", e),
        })?;
        // Editors often replace the file instead of writing it, so watch the directory
        watcher.watch(project_root, RecursiveMode::NonRecursive)?;

        let config_tx = self.config_tx.clone();
        let debounce = self.watch_debounce;
        let config_path = project_root.join(PROJECT_CONFIG_FILE);
        let forwarder = tokio::spawn(async move {
            while rx.recv().await.is_some() {
                // One save usually produces several events
                tokio::time::sleep(debounce).await;
                while rx.try_recv().is_ok() {}

                info!("Detected change in {}", config_path.display());
                let _ = config_tx.send(());
            }
        });

        Ok(ConfigWatcher {
            _watcher: watcher,
            forwarder,
        })
    }

    fn spawn_initial_probe(&self, base_url: String) {
        let http = self.http.clone();
        let warning_tx = self.warning_tx.clone();

        tokio::spawn(async move {
            if let Err(e) = probe_base_url(&http, &base_url).await {
                warn!("Base url {} is unreachable: {}", base_url, e);
                let warning = ProjectWarning::cannot_connect_base_url(&base_url, &e.message);
                let _ = warning_tx.send(Ok(warning));
            }
        });
    }
}

#[async_trait]
impl ProjectIpc for LocalIpc {
    async fn get_options(&self) -> RemoteResult<LaunchOptions> {
        Ok(self.options.clone())
    }

    async fn get_current_user(&self) -> RemoteResult<Option<User>> {
        read_user_file(&self.user_file).await
    }

    async fn open_project(&self, project_root: &Path) -> RemoteResult<ProjectConfig> {
        info!("Opening project at {}", project_root.display());
        let config = read_project_config(project_root).await?;
        let watcher = match self.watch_config(project_root) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                warn!("Not watching {} for changes: {}", project_root.display(), e);
                None
            }
        };

        {
            let mut opened = self
                .opened
                .lock()
                .map_err(|_| RemoteError::new("Project state is unavailable"))?;
            *opened = Some(OpenedProject {
                root: project_root.to_path_buf(),
                config: config.clone(),
                _watcher: watcher,
            });
        }

        if let Some(base_url) = config.base_url.clone() {
            self.spawn_initial_probe(base_url);
        }

        Ok(config)
    }

    async fn get_specs(&self) -> RemoteResult<Vec<Spec>> {
        let (root, config) = self.opened_project()?;
        let spec_dir = root.join(&config.spec_folder);

        tokio::task::spawn_blocking(move || collect_specs(&spec_dir))
            .await
            .map_err(|e| RemoteError::new(format!("Spec listing task failed: {e}")))
    }

    async fn close_project(&self) -> RemoteResult<()> {
        let closed = self
            .opened
            .lock()
            .map_err(|_| RemoteError::new("Project state is unavailable"))?
            .take();

        if let Some(project) = closed {
            info!("Closed project at {}", project.root.display());
        }
        Ok(())
    }

    async fn get_project_status(&self, query: &StatusQuery) -> RemoteResult<ProjectStatus> {
        let api_url = self
            .api_url
            .as_deref()
            .ok_or_else(|| RemoteError::new("No dashboard API url configured"))?;
        // A user file removed while the session is open means the user signed out elsewhere
        let user = read_user_file(&self.user_file)
            .await?
            .ok_or_else(RemoteError::unauthorized)?;

        let url = format!("{}/projects/{}/status", api_url.trim_end_matches('/'), query.id);
        debug!("Requesting project status from {}", url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(&user.auth_token)
            .query(&[("path", query.path.to_string_lossy())])
            .send()
            .await
            .map_err(|e| RemoteError::new(format!("Failed to reach dashboard: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_from_response(status.as_u16(), &body));
        }

        response
            .json::<ProjectStatus>()
            .await
            .map_err(|e| RemoteError::new(format!("Malformed project status: {e}")))
    }

    async fn ping_base_url(&self) -> RemoteResult<()> {
        let (_, config) = self.opened_project()?;
        match config.base_url {
            Some(base_url) => probe_base_url(&self.http, &base_url).await,
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

fn touches_project_config(event: &Event) -> bool {
    let relevant = match event.kind {
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => true,
        _ => false,
    };
    relevant
        && event
            .paths
            .iter()
            .any(|path| path.file_name().is_some_and(|name| name == PROJECT_CONFIG_FILE))
}

/// Read `project.json` from the project root; a missing file means an unconfigured project
pub async fn read_project_config(project_root: &Path) -> RemoteResult<ProjectConfig> {
    let path = project_root.join(PROJECT_CONFIG_FILE);
    match tokio::fs::read_to_string(&path).await {
        Ok(content) => serde_json::from_str(&content).map_err(|e| {
            RemoteError::new(format!("Error parsing {}: {e}", path.display())).named("ConfigError")
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No {} in {}, using defaults", PROJECT_CONFIG_FILE, project_root.display());
            Ok(ProjectConfig::default())
        }
        Err(e) => Err(RemoteError::new(format!("Could not read {}: {e}", path.display()))),
    }
}

pub async fn read_user_file(path: &Path) -> RemoteResult<Option<User>> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| RemoteError::new(format!("Error parsing {}: {e}", path.display()))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(RemoteError::new(format!("Could not read {}: {e}", path.display()))),
    }
}

async fn probe_base_url(http: &reqwest::Client, base_url: &str) -> RemoteResult<()> {
    // Any HTTP response means something is listening
    http.get(base_url).send().await.map(|_| ()).map_err(|e| {
        RemoteError::new(format!("Cannot connect to base url {base_url}: {e}"))
            .named(CANNOT_CONNECT_BASE_URL_WARNING)
    })
}

/// Build a `RemoteError` from a non-success dashboard response
pub fn error_from_response(status_code: u16, body: &str) -> RemoteError {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        message: String,
    }

    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|parsed| parsed.message)
        .unwrap_or_else(|_| body.trim().to_string());
    let message = if message.is_empty() {
        format!("Request failed with status {status_code}")
    } else {
        message
    };

    RemoteError::with_status(status_code, message)
}

/// Spec files under `spec_dir`, sorted by relative path. Symlinked directories are
/// followed; a link back into an ancestor is reported and skipped.
fn collect_specs(spec_dir: &Path) -> Vec<Spec> {
    if !spec_dir.is_dir() {
        return Vec::new();
    }

    let mut specs: Vec<Spec> = WalkDir::new(spec_dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping entry while listing specs: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| SPEC_EXTENSIONS.contains(&ext))
        })
        .map(|entry| {
            let path = entry.into_path();
            let relative = path
                .strip_prefix(spec_dir)
                .unwrap_or(&path)
                .to_string_lossy()
                .replace('\\', "/");
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();

            Spec {
                name,
                relative,
                absolute: path,
            }
        })
        .collect();

    specs.sort_by(|a, b| a.relative.cmp(&b.relative));
    specs
}
