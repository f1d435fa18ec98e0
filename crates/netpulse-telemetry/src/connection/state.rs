//! Connection state of a push channel.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a connection manager's channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No channel is open and no attempt is running.
    #[default]
    Disconnected,
    /// A channel open handshake is in progress.
    Connecting,
    /// A channel is open and messages are being delivered.
    Connected,
}

impl ConnectionState {
    /// Whether a channel is open.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
        }
    }
}
