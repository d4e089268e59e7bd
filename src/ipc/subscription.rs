// ABOUTME: Cancellable subscription that forwards pushed events from a broadcast channel
// Aborting the forwarding task guarantees no callback fires after teardown

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug)]
pub struct Subscription {
    name: &'static str,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Spawn a task that hands every received event to `on_event` until the
    /// channel closes, `on_event` returns false, or the subscription is cancelled.
    pub fn forward<T, F>(name: &'static str, mut receiver: broadcast::Receiver<T>, mut on_event: F) -> Self
    where
        T: Clone + Send + 'static,
        F: FnMut(T) -> bool + Send + 'static,
    {
        let task = tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => {
                        if !on_event(event) {
                            debug!("Subscription {} stopped by its handler", name);
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Subscription {} lagged, skipped {} events", name, skipped);
                    }
                    Err(RecvError::Closed) => {
                        debug!("Subscription {} channel closed", name);
                        break;
                    }
                }
            }
        });

        Self {
            name,
            task: Some(task),
        }
    }

    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            debug!("Cancelling subscription {}", self.name);
            task.abort();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}
