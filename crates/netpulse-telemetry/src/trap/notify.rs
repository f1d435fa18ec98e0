//! Best-effort local notifications for link events.
//!
//! Notifications never influence ingestion: a failing or missing notifier
//! only loses the notification.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use netpulse_core::error::AppError;

use super::event::{LinkEvent, TrapEvent};

/// Sink for user-facing link notifications.
pub trait LinkNotifier: Send + Sync {
    /// Deliver a notification for `event`.
    fn notify(&self, event: &TrapEvent) -> Result<(), AppError>;
}

/// Notifier that emits a log line per event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl LinkNotifier for TracingNotifier {
    fn notify(&self, event: &TrapEvent) -> Result<(), AppError> {
        match event.event {
            LinkEvent::LinkDown => warn!(
                router = %event.router_name,
                router_id = %event.router_id,
                interface = %event.interface_name,
                if_index = event.interface_index,
                "Interface went down"
            ),
            LinkEvent::LinkUp => info!(
                router = %event.router_name,
                router_id = %event.router_id,
                interface = %event.interface_name,
                if_index = event.interface_index,
                "Interface came up"
            ),
        }
        Ok(())
    }
}

/// Suppresses repeats of the same key within a time window.
#[derive(Debug)]
pub struct NotificationThrottle {
    window: Duration,
    last_seen: Mutex<HashMap<String, Instant>>,
}

impl NotificationThrottle {
    /// Create a throttle with the given window.
    pub fn new(window_ms: u64) -> Self {
        Self {
            window: Duration::from_millis(window_ms),
            last_seen: Mutex::new(HashMap::new()),
        }
    }

    /// Returns `true` if a notification for `key` may go out now.
    pub fn should_notify(&self, key: &str) -> bool {
        let mut map = self.last_seen.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();

        if let Some(last) = map.get(key) {
            if now.duration_since(*last) < self.window {
                return false;
            }
        }

        map.insert(key.to_string(), now);
        // Keep entries for 10x the window.
        let cutoff = self.window * 10;
        map.retain(|_, seen| now.duration_since(*seen) < cutoff);
        true
    }

    /// Throttle key for an event: `routerId:interfaceIndex:event`.
    pub fn make_key(event: &TrapEvent) -> String {
        format!("{}:{}", event.interface_key(), event.event)
    }
}

/// A notifier fronted by a [`NotificationThrottle`].
pub struct ThrottledNotifier<N> {
    inner: N,
    throttle: NotificationThrottle,
}

impl<N: LinkNotifier> ThrottledNotifier<N> {
    /// Wrap `inner`, suppressing repeats within `window_ms`.
    pub fn new(inner: N, window_ms: u64) -> Self {
        Self {
            inner,
            throttle: NotificationThrottle::new(window_ms),
        }
    }
}

impl<N: LinkNotifier> LinkNotifier for ThrottledNotifier<N> {
    fn notify(&self, event: &TrapEvent) -> Result<(), AppError> {
        if self.throttle.should_notify(&NotificationThrottle::make_key(event)) {
            self.inner.notify(event)
        } else {
            tracing::trace!(key = %NotificationThrottle::make_key(event), "Notification throttled");
            Ok(())
        }
    }
}
