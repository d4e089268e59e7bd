// ABOUTME: Status poller that requests project status immediately and then on a fixed interval
// Owns one cancellable task per session; starting a new poll always cancels the previous one

use crate::ipc::{ProjectIpc, RemoteResult};
use crate::models::{ProjectStatus, StatusQuery};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Interval between project status requests
pub const STATUS_POLL_INTERVAL: Duration = Duration::from_millis(10_000);

/// Receives each poll result together with the generation of the session that issued it
pub type StatusSink = Arc<dyn Fn(u64, RemoteResult<ProjectStatus>) + Send + Sync>;

pub struct StatusPoller {
    interval: Duration,
    task: Option<PollTask>,
}

struct PollTask {
    generation: u64,
    handle: JoinHandle<()>,
}

impl StatusPoller {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            task: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.handle.is_finished())
    }

    /// Generation of the session currently being polled
    pub fn generation(&self) -> Option<u64> {
        self.task.as_ref().map(|task| task.generation)
    }

    /// Start polling `query`; the first request goes out right away.
    pub fn start(
        &mut self,
        generation: u64,
        query: StatusQuery,
        ipc: Arc<dyn ProjectIpc>,
        sink: StatusSink,
    ) {
        self.stop();

        info!(
            "Polling status of project {} every {:?}",
            query.id, self.interval
        );
        let period = self.interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // Dropped together with this task, which aborts any request still in flight
            let mut in_flight = JoinSet::new();

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let ipc = ipc.clone();
                        let query = query.clone();
                        let sink = sink.clone();
                        in_flight.spawn(async move {
                            debug!("Requesting status for project {}", query.id);
                            let outcome = ipc.get_project_status(&query).await;
                            sink(generation, outcome);
                        });
                    }
                    Some(_) = in_flight.join_next(), if !in_flight.is_empty() => {}
                }
            }
        });

        self.task = Some(PollTask { generation, handle });
    }

    /// Cancel the poll task. Returns whether one was running.
    pub fn stop(&mut self) -> bool {
        match self.task.take() {
            Some(task) => {
                debug!("Stopping status poller for generation {}", task.generation);
                task.handle.abort();
                true
            }
            None => false,
        }
    }
}

impl Default for StatusPoller {
    fn default() -> Self {
        Self::new(STATUS_POLL_INTERVAL)
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        self.stop();
    }
}
