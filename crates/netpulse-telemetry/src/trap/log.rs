//! Bounded link-event log with running statistics.

use std::collections::VecDeque;
use std::sync::{Arc, RwLock};

use tracing::debug;

use netpulse_core::config::HistoryConfig;
use netpulse_core::types::DeviceId;

use super::event::TrapEvent;
use super::notify::{LinkNotifier, ThrottledNotifier, TracingNotifier};
use super::statistics::{InterfaceCounters, TrapStatistics};

/// A trap log shared between a connection manager (as an observer) and readers.
pub type SharedTrapLog = Arc<RwLock<TrapEventLog>>;

/// Most-recent-first ring of link events for one observer.
///
/// Each log owns its buffer and statistics. Views that care about a single
/// device should use their own filtered log instead of toggling the filter
/// on a shared one.
pub struct TrapEventLog {
    events: VecDeque<TrapEvent>,
    max_events: usize,
    statistics: TrapStatistics,
    filter: Option<DeviceId>,
    notifier: Option<Box<dyn LinkNotifier>>,
}

impl TrapEventLog {
    /// Create an unfiltered log holding at most `max_events` events.
    pub fn new(max_events: usize) -> Self {
        Self {
            events: VecDeque::new(),
            max_events: max_events.max(1),
            statistics: TrapStatistics::default(),
            filter: None,
            notifier: None,
        }
    }

    /// Create a log that only accepts events from `router_id`.
    pub fn filtered(max_events: usize, router_id: DeviceId) -> Self {
        Self {
            filter: Some(router_id),
            ..Self::new(max_events)
        }
    }

    /// Build a log from configuration, attaching a throttled tracing notifier
    /// when notifications are enabled.
    pub fn from_config(config: &HistoryConfig, filter: Option<DeviceId>) -> Self {
        let mut log = Self::new(config.max_events);
        log.filter = filter;
        if config.notifications_enabled {
            log.notifier = Some(Box::new(ThrottledNotifier::new(
                TracingNotifier,
                config.notification_window_ms,
            )));
        }
        log
    }

    /// Attach a notifier.
    pub fn with_notifier(mut self, notifier: Box<dyn LinkNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Wrap in the shared form used for observer registration.
    pub fn into_shared(self) -> SharedTrapLog {
        Arc::new(RwLock::new(self))
    }

    /// Record an event.
    ///
    /// Returns `false` (and changes nothing) when the event does not match
    /// the device filter.
    pub fn ingest(&mut self, event: TrapEvent) -> bool {
        if !self.matches(&event) {
            return false;
        }

        self.statistics.record(&event);

        if let Some(notifier) = &self.notifier {
            if let Err(e) = notifier.notify(&event) {
                debug!(error = %e, "Link notification failed");
            }
        }

        self.events.push_front(event);
        self.events.truncate(self.max_events);
        true
    }

    fn matches(&self, event: &TrapEvent) -> bool {
        self.filter
            .as_ref()
            .is_none_or(|router_id| *router_id == event.router_id)
    }

    /// Events visible through the current filter, most recent first.
    pub fn events(&self) -> Vec<TrapEvent> {
        self.events
            .iter()
            .filter(|event| self.matches(event))
            .cloned()
            .collect()
    }

    /// Events for one device, most recent first. Does not change the filter.
    pub fn events_for(&self, router_id: &str) -> Vec<TrapEvent> {
        self.events
            .iter()
            .filter(|event| event.router_id.as_str() == router_id)
            .cloned()
            .collect()
    }

    /// Current statistics.
    pub fn statistics(&self) -> &TrapStatistics {
        &self.statistics
    }

    /// Counters for one interface.
    pub fn interface_counters(&self, router_id: &str, interface_index: u32) -> InterfaceCounters {
        self.statistics.interface(router_id, interface_index)
    }

    /// Active device filter.
    pub fn filter(&self) -> Option<&DeviceId> {
        self.filter.as_ref()
    }

    /// Change the device filter. Applies to future ingests and to reads.
    pub fn set_filter(&mut self, router_id: Option<DeviceId>) {
        self.filter = router_id;
    }

    /// Capacity of the buffer.
    pub fn max_events(&self) -> usize {
        self.max_events
    }

    /// Number of buffered events (ignoring the filter).
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drop buffered events, keeping statistics.
    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    /// Reset statistics, keeping buffered events.
    pub fn clear_statistics(&mut self) {
        self.statistics = TrapStatistics::default();
    }

    /// Drop events and statistics.
    pub fn clear_all(&mut self) {
        self.clear_events();
        self.clear_statistics();
    }
}

impl std::fmt::Debug for TrapEventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrapEventLog")
            .field("events", &self.events.len())
            .field("max_events", &self.max_events)
            .field("filter", &self.filter)
            .field("notifier", &self.notifier.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trap::event::{LinkEvent, sample_event};
    use netpulse_core::error::AppError;

    struct FailingNotifier;

    impl LinkNotifier for FailingNotifier {
        fn notify(&self, _event: &TrapEvent) -> Result<(), AppError> {
            Err(AppError::internal("notification permission denied"))
        }
    }

    #[test]
    fn test_most_recent_first_and_bounded() {
        let mut log = TrapEventLog::new(3);
        for index in 1..=5 {
            log.ingest(sample_event("r1", index, LinkEvent::LinkDown));
        }
        let indexes: Vec<u32> = log.events().iter().map(|e| e.interface_index).collect();
        assert_eq!(indexes, vec![5, 4, 3]);
        // Statistics cover every event, not only buffered ones.
        assert_eq!(log.statistics().total_events, 5);
    }

    #[test]
    fn test_counters_match_ingested_events() {
        let mut log = TrapEventLog::new(10);
        for _ in 0..4 {
            log.ingest(sample_event("r1", 7, LinkEvent::LinkUp));
        }
        for _ in 0..2 {
            log.ingest(sample_event("r1", 7, LinkEvent::LinkDown));
        }
        assert_eq!(
            log.interface_counters("r1", 7),
            InterfaceCounters { up: 4, down: 2 }
        );
        assert_eq!(
            log.statistics().last_event.as_ref().map(|e| e.event),
            Some(LinkEvent::LinkDown)
        );
    }

    #[test]
    fn test_filter_ignores_other_devices() {
        let mut log = TrapEventLog::filtered(10, DeviceId::new("r1"));
        log.ingest(sample_event("r1", 1, LinkEvent::LinkUp));
        let before = log.statistics().clone();

        assert!(!log.ingest(sample_event("r2", 1, LinkEvent::LinkDown)));
        assert_eq!(log.len(), 1);
        assert_eq!(log.statistics(), &before);
    }

    #[test]
    fn test_read_time_filter_does_not_mutate() {
        let mut log = TrapEventLog::new(10);
        log.ingest(sample_event("r1", 1, LinkEvent::LinkUp));
        log.ingest(sample_event("r2", 1, LinkEvent::LinkUp));

        assert_eq!(log.events_for("r2").len(), 1);
        log.set_filter(Some(DeviceId::new("r1")));
        assert_eq!(log.events().len(), 1);
        log.set_filter(None);
        assert_eq!(log.events().len(), 2);
    }

    #[test]
    fn test_clear_operations() {
        let mut log = TrapEventLog::new(10);
        log.ingest(sample_event("r1", 1, LinkEvent::LinkUp));

        log.clear_events();
        assert!(log.is_empty());
        assert_eq!(log.statistics().total_events, 1);

        log.ingest(sample_event("r1", 1, LinkEvent::LinkUp));
        log.clear_statistics();
        assert_eq!(log.len(), 1);
        assert_eq!(log.statistics().total_events, 0);

        log.clear_all();
        assert!(log.is_empty());
        assert!(log.statistics().last_event.is_none());
    }

    #[test]
    fn test_failing_notifier_does_not_block_ingest() {
        let mut log = TrapEventLog::new(5).with_notifier(Box::new(FailingNotifier));
        assert!(log.ingest(sample_event("r1", 1, LinkEvent::LinkDown)));
        assert_eq!(log.len(), 1);
        assert_eq!(log.statistics().link_down_count, 1);
    }

    #[test]
    fn test_from_config_applies_bounds() {
        let config = HistoryConfig {
            max_events: 2,
            ..HistoryConfig::default()
        };
        let log = TrapEventLog::from_config(&config, Some(DeviceId::new("r1")));
        assert_eq!(log.max_events(), 2);
        assert_eq!(log.filter(), Some(&DeviceId::new("r1")));
    }
}
