// ABOUTME: Connectivity warning manager tracking the unreachable base URL warning and its retries
// Probe outcomes are applied in attempt order so a slow stale probe never overrides a newer one

use crate::ipc::RemoteResult;
use crate::models::ConnectivityWarning;
use tracing::{debug, info};

/// Number identifying one `retry()` invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RetryAttempt(pub u64);

#[derive(Debug, Default)]
pub struct ConnectivityWarningManager {
    warning: Option<ConnectivityWarning>,
    issued: u64,
    last_resolved: u64,
}

impl ConnectivityWarningManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&ConnectivityWarning> {
        self.warning.as_ref()
    }

    pub fn is_visible(&self) -> bool {
        self.warning.as_ref().is_some_and(|w| w.raised)
    }

    pub fn pending_attempts(&self) -> u64 {
        self.issued - self.last_resolved
    }

    pub fn raise(&mut self, message: String) {
        info!("Connectivity warning raised: {}", message);
        let retrying = self.pending_attempts() > 0;
        self.warning = Some(ConnectivityWarning {
            message,
            raised: true,
            retrying,
        });
    }

    /// Register a new probe. Visibility is unchanged until the probe resolves.
    pub fn begin_retry(&mut self) -> RetryAttempt {
        self.issued += 1;
        if let Some(warning) = self.warning.as_mut() {
            warning.retrying = true;
        }
        debug!("Starting base url probe #{}", self.issued);
        RetryAttempt(self.issued)
    }

    /// Apply a probe outcome. Returns false when the outcome was stale and ignored.
    pub fn resolve(&mut self, attempt: RetryAttempt, outcome: RemoteResult<()>) -> bool {
        if attempt.0 <= self.last_resolved {
            debug!(
                "Ignoring stale probe #{} (already resolved #{})",
                attempt.0, self.last_resolved
            );
            return false;
        }
        self.last_resolved = attempt.0;

        match outcome {
            Ok(()) => {
                if self.warning.take().is_some() {
                    info!("Base url reachable again, clearing warning");
                }
            }
            Err(e) => self.raise(e.message),
        }

        if let Some(warning) = self.warning.as_mut() {
            warning.retrying = self.issued > self.last_resolved;
        }
        true
    }

    /// Drop the warning and mark every outstanding probe stale
    pub fn clear(&mut self) {
        self.warning = None;
        self.last_resolved = self.issued;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipc::RemoteError;

    fn unreachable() -> RemoteResult<()> {
        Err(RemoteError::new("Cannot connect to base url http://localhost:8080"))
    }

    #[test]
    fn test_failed_retry_keeps_warning_then_success_hides_it() {
        let mut manager = ConnectivityWarningManager::new();
        manager.raise("base url unreachable".to_string());
        assert!(manager.is_visible());

        let first = manager.begin_retry();
        assert!(manager.is_visible());
        assert!(manager.current().unwrap().retrying);
        assert!(manager.resolve(first, unreachable()));
        assert!(manager.is_visible());
        assert!(!manager.current().unwrap().retrying);
        assert!(manager.current().unwrap().message.contains("localhost:8080"));

        let second = manager.begin_retry();
        assert!(manager.resolve(second, Ok(())));
        assert!(!manager.is_visible());
        assert!(manager.current().is_none());
    }

    #[test]
    fn test_failed_probe_raises_even_without_prior_warning() {
        let mut manager = ConnectivityWarningManager::new();
        let attempt = manager.begin_retry();
        manager.resolve(attempt, unreachable());
        assert!(manager.is_visible());
    }

    #[test]
    fn test_repeated_successes_do_not_reshow() {
        let mut manager = ConnectivityWarningManager::new();
        manager.raise("base url unreachable".to_string());

        for _ in 0..3 {
            let attempt = manager.begin_retry();
            manager.resolve(attempt, Ok(()));
            assert!(!manager.is_visible());
        }
    }

    #[test]
    fn test_stale_probe_does_not_override_newer_outcome() {
        let mut manager = ConnectivityWarningManager::new();
        manager.raise("base url unreachable".to_string());

        let slow = manager.begin_retry();
        let fast = manager.begin_retry();

        assert!(manager.resolve(fast, Ok(())));
        assert!(!manager.is_visible());

        assert!(!manager.resolve(slow, unreachable()));
        assert!(!manager.is_visible());
    }

    #[test]
    fn test_clear_makes_outstanding_probes_stale() {
        let mut manager = ConnectivityWarningManager::new();
        manager.raise("base url unreachable".to_string());
        let attempt = manager.begin_retry();

        manager.clear();
        assert_eq!(manager.pending_attempts(), 0);
        assert!(!manager.resolve(attempt, unreachable()));
        assert!(!manager.is_visible());
    }
}
