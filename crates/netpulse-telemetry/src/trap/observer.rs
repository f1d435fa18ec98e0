//! Observer registry that fans link events out to independent event logs.

use std::sync::{Arc, RwLock};

use dashmap::DashMap;
use uuid::Uuid;

use super::event::TrapEvent;
use super::log::TrapEventLog;

/// Identifier returned when an observer is registered.
pub type ObserverId = Uuid;

/// Receives link events from a connection manager.
///
/// Called on the manager's message-handling path, so implementations must
/// not block.
pub trait EventObserver: Send + Sync {
    /// Handle one link event.
    fn on_link_event(&self, event: &TrapEvent);
}

impl EventObserver for RwLock<TrapEventLog> {
    fn on_link_event(&self, event: &TrapEvent) {
        let mut log = self.write().unwrap_or_else(|e| e.into_inner());
        log.ingest(event.clone());
    }
}

/// Registry of observers subscribed to one connection manager.
#[derive(Default)]
pub struct ObserverRegistry {
    observers: DashMap<ObserverId, Arc<dyn EventObserver>>,
}

impl ObserverRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an observer and returns its id.
    pub fn subscribe(&self, observer: Arc<dyn EventObserver>) -> ObserverId {
        let id = Uuid::new_v4();
        self.observers.insert(id, observer);
        id
    }

    /// Removes an observer. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: &ObserverId) -> bool {
        self.observers.remove(id).is_some()
    }

    /// Delivers an event to every observer. Returns the number notified.
    pub fn dispatch(&self, event: &TrapEvent) -> usize {
        let observers: Vec<Arc<dyn EventObserver>> = self
            .observers
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        for observer in &observers {
            observer.on_link_event(event);
        }
        observers.len()
    }

    /// Number of registered observers.
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Whether no observer is registered.
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Removes every observer.
    pub fn clear(&self) {
        self.observers.clear();
    }
}

impl std::fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("observers", &self.observers.len())
            .finish()
    }
}
