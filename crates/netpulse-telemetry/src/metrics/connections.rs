//! Connection metrics helpers.

use std::sync::atomic::Ordering;

use super::ChannelMetrics;

/// Record a channel open attempt
pub fn record_attempt(metrics: &ChannelMetrics) {
    metrics.connect_attempts.fetch_add(1, Ordering::Relaxed);
}

/// Record a session reaching `connected`
pub fn record_opened(metrics: &ChannelMetrics) {
    metrics.sessions_opened.fetch_add(1, Ordering::Relaxed);
}

/// Record a scheduled reconnect
pub fn record_reconnect_scheduled(metrics: &ChannelMetrics) {
    metrics.reconnects_scheduled.fetch_add(1, Ordering::Relaxed);
}
