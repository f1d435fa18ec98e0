//! Push channel counters.

pub mod connections;
pub mod messages;

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Counters for one connection manager.
#[derive(Debug, Default)]
pub struct ChannelMetrics {
    /// Text frames received
    pub messages_received: AtomicU64,
    /// Metric samples stored
    pub samples_ingested: AtomicU64,
    /// Metric samples ignored as duplicates
    pub samples_deduplicated: AtomicU64,
    /// Link events handed to observers
    pub events_dispatched: AtomicU64,
    /// Frames dropped as malformed
    pub messages_dropped: AtomicU64,
    /// Channel open attempts
    pub connect_attempts: AtomicU64,
    /// Sessions that reached `connected`
    pub sessions_opened: AtomicU64,
    /// Reconnects scheduled after a live session dropped
    pub reconnects_scheduled: AtomicU64,
}

impl ChannelMetrics {
    /// Create new zeroed metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a snapshot of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_received: self.messages_received.load(Ordering::Relaxed),
            samples_ingested: self.samples_ingested.load(Ordering::Relaxed),
            samples_deduplicated: self.samples_deduplicated.load(Ordering::Relaxed),
            events_dispatched: self.events_dispatched.load(Ordering::Relaxed),
            messages_dropped: self.messages_dropped.load(Ordering::Relaxed),
            connect_attempts: self.connect_attempts.load(Ordering::Relaxed),
            sessions_opened: self.sessions_opened.load(Ordering::Relaxed),
            reconnects_scheduled: self.reconnects_scheduled.load(Ordering::Relaxed),
        }
    }
}

/// Serializable counters snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Text frames received
    pub messages_received: u64,
    /// Metric samples stored
    pub samples_ingested: u64,
    /// Metric samples ignored as duplicates
    pub samples_deduplicated: u64,
    /// Link events handed to observers
    pub events_dispatched: u64,
    /// Frames dropped as malformed
    pub messages_dropped: u64,
    /// Channel open attempts
    pub connect_attempts: u64,
    /// Sessions that reached `connected`
    pub sessions_opened: u64,
    /// Reconnects scheduled
    pub reconnects_scheduled: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_helpers() {
        let metrics = ChannelMetrics::new();
        messages::record_received(&metrics);
        messages::record_received(&metrics);
        messages::record_dropped(&metrics);
        connections::record_attempt(&metrics);
        connections::record_reconnect_scheduled(&metrics);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.messages_received, 2);
        assert_eq!(snapshot.messages_dropped, 1);
        assert_eq!(snapshot.connect_attempts, 1);
        assert_eq!(snapshot.reconnects_scheduled, 1);
        assert_eq!(snapshot.samples_ingested, 0);
    }
}
