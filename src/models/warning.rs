// ABOUTME: Warning payloads pushed by the host and the connectivity warning shown to the user

use serde::{Deserialize, Serialize};

/// Warning type the host uses when the configured base URL cannot be reached
pub const CANNOT_CONNECT_BASE_URL_WARNING: &str = "CANNOT_CONNECT_BASE_URL_WARNING";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectWarning {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub message: String,
}

impl ProjectWarning {
    pub fn cannot_connect_base_url(base_url: &str, reason: &str) -> Self {
        Self {
            kind: CANNOT_CONNECT_BASE_URL_WARNING.to_string(),
            name: "Cannot connect to base url".to_string(),
            message: format!(
                "We are verifying this server because it has been configured as your baseUrl: {base_url} ({reason})"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectivityWarning {
    pub message: String,
    pub raised: bool,
    /// A reachability probe is in flight
    pub retrying: bool,
}

impl ConnectivityWarning {
    pub fn raised(message: String) -> Self {
        Self {
            message,
            raised: true,
            retrying: false,
        }
    }
}
