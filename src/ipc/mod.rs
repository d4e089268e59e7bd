// ABOUTME: Collaborator surface the controller talks to: remote calls, pushed events and their errors
// Also provides the filesystem/HTTP-backed transport used by the binary

pub mod error;
pub mod local;
pub mod subscription;
pub mod transport;

pub use error::{RemoteError, RemoteResult, UNAUTHORIZED};
pub use local::LocalIpc;
pub use subscription::Subscription;
pub use transport::ProjectIpc;
