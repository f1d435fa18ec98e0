//! In-memory history limits.

use serde::{Deserialize, Serialize};

/// Bounds for the metric store and trap event logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Samples kept per device and metric.
    #[serde(default = "default_max_data_points")]
    pub max_data_points: usize,
    /// Link events kept per event log.
    #[serde(default = "default_max_events")]
    pub max_events: usize,
    /// Whether link events raise a local notification.
    #[serde(default = "default_true")]
    pub notifications_enabled: bool,
    /// Window within which repeated notifications for one interface are suppressed.
    #[serde(default = "default_notification_window")]
    pub notification_window_ms: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_data_points: default_max_data_points(),
            max_events: default_max_events(),
            notifications_enabled: true,
            notification_window_ms: default_notification_window(),
        }
    }
}

fn default_max_data_points() -> usize {
    50
}

fn default_max_events() -> usize {
    100
}

fn default_true() -> bool {
    true
}

fn default_notification_window() -> u64 {
    30_000
}
