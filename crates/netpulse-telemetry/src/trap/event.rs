//! Link event type definitions.

use std::fmt;

use serde::{Deserialize, Serialize};

use netpulse_core::types::DeviceId;

/// Direction of an interface transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkEvent {
    /// Interface came up.
    LinkUp,
    /// Interface went down.
    LinkDown,
}

impl LinkEvent {
    /// Wire tag of this event.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LinkUp => "link_up",
            Self::LinkDown => "link_down",
        }
    }

    /// Parse a wire tag; `None` for anything that is not a link event.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "link_up" => Some(Self::LinkUp),
            "link_down" => Some(Self::LinkDown),
            _ => None,
        }
    }
}

impl fmt::Display for LinkEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An interface up/down notification relayed by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrapEvent {
    /// Device that raised the trap.
    pub router_id: DeviceId,
    /// Device display name.
    #[serde(default)]
    pub router_name: String,
    /// Device management address.
    #[serde(default)]
    pub router_ip: String,
    /// SNMP ifIndex of the interface.
    pub interface_index: u32,
    /// Interface name (ifDescr / ifName).
    #[serde(default)]
    pub interface_name: String,
    /// Transition direction.
    pub event: LinkEvent,
    /// ifAdminStatus (1 = up, 2 = down, 3 = testing).
    #[serde(default)]
    pub admin_status: i32,
    /// ifOperStatus (1 = up, 2 = down, ...).
    #[serde(default)]
    pub oper_status: i32,
    /// ISO-8601 time the trap was received by the backend.
    #[serde(default)]
    pub timestamp: String,
    /// OID of the trap (linkUp / linkDown).
    #[serde(default)]
    pub trap_oid: String,
}

impl TrapEvent {
    /// Key used for per-interface statistics: `routerId:interfaceIndex`.
    pub fn interface_key(&self) -> String {
        interface_key(self.router_id.as_str(), self.interface_index)
    }
}

/// Build a per-interface statistics key.
pub fn interface_key(router_id: &str, interface_index: u32) -> String {
    format!("{router_id}:{interface_index}")
}

#[cfg(test)]
pub(crate) fn sample_event(router_id: &str, interface_index: u32, event: LinkEvent) -> TrapEvent {
    TrapEvent {
        router_id: DeviceId::new(router_id),
        router_name: format!("{router_id}-name"),
        router_ip: "10.0.0.1".to_string(),
        interface_index,
        interface_name: format!("ether{interface_index}"),
        event,
        admin_status: 1,
        oper_status: if event == LinkEvent::LinkUp { 1 } else { 2 },
        timestamp: "2024-05-01T12:00:00Z".to_string(),
        trap_oid: match event {
            LinkEvent::LinkUp => "1.3.6.1.6.3.1.1.5.4".to_string(),
            LinkEvent::LinkDown => "1.3.6.1.6.3.1.1.5.3".to_string(),
        },
    }
}
