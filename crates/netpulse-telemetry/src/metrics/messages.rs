//! Message metrics helpers.

use std::sync::atomic::Ordering;

use super::ChannelMetrics;

/// Record a text frame received from the backend
pub fn record_received(metrics: &ChannelMetrics) {
    metrics.messages_received.fetch_add(1, Ordering::Relaxed);
}

/// Record a metric sample stored (or deduplicated)
pub fn record_sample(metrics: &ChannelMetrics, stored: bool) {
    if stored {
        metrics.samples_ingested.fetch_add(1, Ordering::Relaxed);
    } else {
        metrics.samples_deduplicated.fetch_add(1, Ordering::Relaxed);
    }
}

/// Record a link event handed to observers
pub fn record_event(metrics: &ChannelMetrics) {
    metrics.events_dispatched.fetch_add(1, Ordering::Relaxed);
}

/// Record a malformed frame
pub fn record_dropped(metrics: &ChannelMetrics) {
    metrics.messages_dropped.fetch_add(1, Ordering::Relaxed);
}
