// ABOUTME: Main entry point for the project session command-line front-end

use anyhow::{Context, Result};
use clap::Parser;
use project_session::app::{ControllerConfig, ProjectController};
use project_session::config::AppConfig;
use project_session::ipc::LocalIpc;
use project_session::models::LaunchOptions;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "project-session", version, about = "Open a project and keep its session alive")]
struct Cli {
    /// Project root to open
    #[arg(short, long)]
    project: PathBuf,

    /// Config file (defaults to ~/.project-session/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    setup_logging(&config)?;

    let project_root = std::fs::canonicalize(&cli.project)
        .with_context(|| format!("Project root {} does not exist", cli.project.display()))?;
    let options = LaunchOptions {
        project_root: Some(project_root),
    };
    let ipc = Arc::new(LocalIpc::new(options, &config)?);
    let handle = ProjectController::spawn(ipc, ControllerConfig::default());

    println!("Commands: r = retry base url, o = reopen project, q = quit");
    if let Err(e) = handle.start().await {
        error!("Failed to start session: {}", e);
        eprintln!("Failed to start session: {e}");
    }

    let mut state = handle.watch_state();
    let mut last_summary = String::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let summary = state.borrow_and_update().summary();
        if summary != last_summary {
            println!("{summary}");
            last_summary = summary;
        }

        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            line = lines.next_line() => {
                match line?.as_deref().map(str::trim) {
                    Some("r") => handle.retry()?,
                    Some("o") => {
                        if let Err(e) = handle.reopen().await {
                            eprintln!("Failed to reopen project: {e}");
                        }
                    }
                    Some("q") | None => break,
                    Some(_) => println!("Commands: r = retry base url, o = reopen project, q = quit"),
                }
            }
        }
    }

    info!("Exiting");
    handle.shutdown().await?;
    Ok(())
}

fn setup_logging(config: &AppConfig) -> Result<()> {
    use std::fs::OpenOptions;
    use tracing_subscriber::prelude::*;

    let log_dir = AppConfig::logs_dir();
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let log_file = log_dir.join(format!(
        "project-session-{}.log",
        chrono::Local::now().format("%Y%m%d-%H%M%S")
    ));
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)
        .with_context(|| format!("Failed to create log file {}", log_file.display()))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(file)
                .with_ansi(false),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.as_str().into()),
        )
        .init();

    Ok(())
}
