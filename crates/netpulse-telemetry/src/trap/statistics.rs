//! Running aggregate statistics over ingested link events.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::event::{LinkEvent, TrapEvent, interface_key};

/// Up/down counts for one interface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceCounters {
    /// Number of `link_up` events.
    pub up: u64,
    /// Number of `link_down` events.
    pub down: u64,
}

/// Aggregates maintained incrementally as events arrive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrapStatistics {
    /// Total events ingested.
    pub total_events: u64,
    /// Total `link_up` events.
    pub link_up_count: u64,
    /// Total `link_down` events.
    pub link_down_count: u64,
    /// `routerId:interfaceIndex` → counters.
    pub per_interface: HashMap<String, InterfaceCounters>,
    /// Most recently ingested event.
    pub last_event: Option<TrapEvent>,
}

impl TrapStatistics {
    /// Fold one event into the aggregates.
    pub fn record(&mut self, event: &TrapEvent) {
        self.total_events += 1;
        let counters = self.per_interface.entry(event.interface_key()).or_default();
        match event.event {
            LinkEvent::LinkUp => {
                self.link_up_count += 1;
                counters.up += 1;
            }
            LinkEvent::LinkDown => {
                self.link_down_count += 1;
                counters.down += 1;
            }
        }
        self.last_event = Some(event.clone());
    }

    /// Counters for one interface (zero when never seen).
    pub fn interface(&self, router_id: &str, interface_index: u32) -> InterfaceCounters {
        self.per_interface
            .get(&interface_key(router_id, interface_index))
            .copied()
            .unwrap_or_default()
    }
}
