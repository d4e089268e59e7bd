// ABOUTME: Session lifecycle components: opener, status poller, auth guard and warning manager
// Each piece is owned by the project controller and driven from its event loop

pub mod auth;
pub mod error;
pub mod opener;
pub mod poller;
pub mod warning;

pub use auth::{AuthGuard, AuthState, Screened};
pub use error::SessionError;
pub use opener::SessionOpener;
pub use poller::{StatusPoller, STATUS_POLL_INTERVAL};
pub use warning::{ConnectivityWarningManager, RetryAttempt};
