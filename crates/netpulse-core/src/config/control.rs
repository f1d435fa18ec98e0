//! Collection control API configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for the start/stop collection endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlConfig {
    /// Base URL; requests go to `{api_url}/collection/{start|stop}/{device_id}`.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl ControlConfig {
    /// Request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

fn default_api_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_request_timeout() -> u64 {
    15
}
