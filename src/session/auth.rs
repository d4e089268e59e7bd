// ABOUTME: Auth guard that screens every remote outcome for an expired session
// A 401 from any call moves the guard to LoggedOut and tells the caller to tear down

use crate::ipc::RemoteResult;
use crate::models::User;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    LoggedIn(User),
    #[default]
    LoggedOut,
}

/// Result of screening a remote outcome
#[derive(Debug)]
pub enum Screened<T> {
    /// Not an auth failure, handle normally
    Passed(RemoteResult<T>),
    /// The session expired; the guard is now logged out
    Expired,
}

#[derive(Debug, Default)]
pub struct AuthGuard {
    state: AuthState,
}

impl AuthGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_user(&self) -> Option<&User> {
        match &self.state {
            AuthState::LoggedIn(user) => Some(user),
            AuthState::LoggedOut => None,
        }
    }

    pub fn is_logged_in(&self) -> bool {
        matches!(self.state, AuthState::LoggedIn(_))
    }

    /// Entered only through the external login flow
    pub fn log_in(&mut self, user: User) {
        info!("User {} is logged in", user.display_name());
        self.state = AuthState::LoggedIn(user);
    }

    pub fn log_out(&mut self) {
        if let AuthState::LoggedIn(user) = &self.state {
            info!("Logging out user {}", user.display_name());
        }
        self.state = AuthState::LoggedOut;
    }

    pub fn screen<T>(&mut self, operation: &str, outcome: RemoteResult<T>) -> Screened<T> {
        match outcome {
            Err(e) if e.is_unauthorized() => {
                warn!("{} returned 401, session expired: {}", operation, e.message);
                self.log_out();
                Screened::Expired
            }
            other => Screened::Passed(other),
        }
    }
}
