//! Push channel configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for the per-device telemetry push channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// WebSocket endpoint streaming metric and link-event messages.
    #[serde(default = "default_url")]
    pub url: String,
    /// Vendor sent with the subscription when the caller does not supply one.
    #[serde(default = "default_vendor")]
    pub vendor: String,
    /// Delay before reconnecting after a live session drops, in milliseconds.
    #[serde(default = "default_reconnect_interval")]
    pub reconnect_interval_ms: u64,
    /// Whether a dropped live session is reopened automatically.
    #[serde(default = "default_true")]
    pub auto_reconnect: bool,
    /// Watchdog for the opening handshake, in milliseconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,
}

impl ChannelConfig {
    /// Reconnect delay as a [`Duration`].
    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval_ms)
    }

    /// Handshake watchdog as a [`Duration`].
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            vendor: default_vendor(),
            reconnect_interval_ms: default_reconnect_interval(),
            auto_reconnect: true,
            connect_timeout_ms: default_connect_timeout(),
        }
    }
}

fn default_url() -> String {
    "ws://localhost:8000/ws/telemetry".to_string()
}

fn default_vendor() -> String {
    "generic".to_string()
}

fn default_reconnect_interval() -> u64 {
    5_000
}

fn default_connect_timeout() -> u64 {
    10_000
}

fn default_true() -> bool {
    true
}
