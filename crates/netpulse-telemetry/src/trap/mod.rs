//! Link-state (trap) events: bounded logs, statistics, observers, and
//! local notifications.

pub mod event;
pub mod log;
pub mod notify;
pub mod observer;
pub mod statistics;

pub use event::{LinkEvent, TrapEvent};
pub use log::{SharedTrapLog, TrapEventLog};
pub use notify::{LinkNotifier, NotificationThrottle, ThrottledNotifier, TracingNotifier};
pub use observer::{EventObserver, ObserverId, ObserverRegistry};
pub use statistics::{InterfaceCounters, TrapStatistics};
