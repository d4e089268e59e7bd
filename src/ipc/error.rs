// ABOUTME: Error type carried by every failed remote call outcome

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Status code signalling that the user's session is no longer valid
pub const UNAUTHORIZED: u16 = 401;

/// Outcome of a remote call: `Ok(payload)` or a failure with optional status code
pub type RemoteResult<T> = Result<T, RemoteError>;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[error("{}", self.describe())]
pub struct RemoteError {
    pub name: String,
    pub message: String,
    pub status_code: Option<u16>,
}

impl RemoteError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            message: message.into(),
            status_code: None,
        }
    }

    pub fn with_status(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            message: message.into(),
            status_code: Some(status_code),
        }
    }

    pub fn unauthorized() -> Self {
        Self::with_status(UNAUTHORIZED, "Unauthorized")
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status_code == Some(UNAUTHORIZED)
    }

    fn describe(&self) -> String {
        match self.status_code {
            Some(code) => format!("{} (status {})", self.message, code),
            None => self.message.clone(),
        }
    }
}
