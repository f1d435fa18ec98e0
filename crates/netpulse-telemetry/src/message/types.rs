//! Inbound message type definitions.
//!
//! The backend multiplexes two kinds of JSON objects on the push channel:
//! link events (`"event": "link_up" | "link_down"`) and metric samples
//! (everything else).

use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

use netpulse_core::error::AppError;
use netpulse_core::types::DeviceId;

use crate::store::{DeviceMeta, MetricSample, MetricValue};
use crate::trap::{LinkEvent, TrapEvent};

use super::validator::{validate_inbound, validate_metric_name};

/// A classified inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// A metric sample destined for the metric store.
    Metric(MetricMessage),
    /// A link event destined for event observers only.
    Link(TrapEvent),
}

/// A metric sample together with the device it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricMessage {
    /// Device the sample belongs to.
    pub device_id: DeviceId,
    /// The sample itself.
    pub sample: MetricSample,
    /// Optional descriptive fields.
    pub meta: DeviceMeta,
}

#[derive(Debug, Deserialize)]
struct RawMetric {
    #[serde(default)]
    device_id: Option<String>,
    #[serde(default)]
    router_id: Option<String>,
    metric: String,
    value: MetricValue,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    device_name: Option<String>,
    #[serde(default)]
    device_type: Option<String>,
    #[serde(default)]
    vendor: Option<String>,
}

impl InboundMessage {
    /// Parse and classify one raw text frame.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        validate_inbound(raw)?;

        let value: Value = serde_json::from_str(raw)
            .map_err(|e| AppError::protocol(format!("Invalid JSON: {e}")))?;
        let Value::Object(object) = value else {
            return Err(AppError::protocol("Message is not a JSON object"));
        };

        if is_link_event(&object) {
            parse_link_event(object).map(Self::Link)
        } else {
            parse_metric(object).map(Self::Metric)
        }
    }

    /// Device the message refers to.
    pub fn device_id(&self) -> &DeviceId {
        match self {
            Self::Metric(metric) => &metric.device_id,
            Self::Link(event) => &event.router_id,
        }
    }
}

fn is_link_event(object: &Map<String, Value>) -> bool {
    object
        .get("event")
        .and_then(Value::as_str)
        .and_then(LinkEvent::from_tag)
        .is_some()
}

fn parse_link_event(mut object: Map<String, Value>) -> Result<TrapEvent, AppError> {
    if !has_id(&object, "router_id") {
        match object.remove("device_id") {
            Some(id) => {
                object.insert("router_id".to_string(), id);
            }
            None => return Err(AppError::protocol("Link event without router_id/device_id")),
        }
    }

    let event: TrapEvent = serde_json::from_value(Value::Object(object))
        .map_err(|e| AppError::protocol(format!("Malformed link event: {e}")))?;
    if event.router_id.is_empty() {
        return Err(AppError::protocol("Link event with empty router_id"));
    }
    Ok(event)
}

fn parse_metric(object: Map<String, Value>) -> Result<MetricMessage, AppError> {
    let raw: RawMetric = serde_json::from_value(Value::Object(object))
        .map_err(|e| AppError::protocol(format!("Malformed metric message: {e}")))?;

    let device_id = raw
        .device_id
        .filter(|id| !id.trim().is_empty())
        .or(raw.router_id.filter(|id| !id.trim().is_empty()))
        .map(DeviceId::from)
        .ok_or_else(|| AppError::protocol("Metric message without device_id/router_id"))?;

    validate_metric_name(&raw.metric)?;

    let timestamp = raw
        .timestamp
        .filter(|ts| !ts.trim().is_empty())
        .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));

    Ok(MetricMessage {
        device_id,
        sample: MetricSample {
            metric: raw.metric,
            value: raw.value,
            timestamp,
        },
        meta: DeviceMeta {
            display_name: raw.device_name,
            device_type: raw.device_type,
            vendor: raw.vendor,
        },
    })
}

fn has_id(object: &Map<String, Value>, key: &str) -> bool {
    object.get(key).is_some_and(|value| !value.is_null())
}

#[cfg(test)]
mod tests {
    use super::*;
    use netpulse_core::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_metric_message() {
        let raw = json!({
            "device_id": "r1",
            "metric": "cpu_usage",
            "value": 42,
            "timestamp": "2024-05-01T12:00:00Z",
            "device_name": "Core",
            "vendor": "mikrotik"
        })
        .to_string();

        let InboundMessage::Metric(msg) = InboundMessage::parse(&raw).unwrap() else {
            panic!("expected metric");
        };
        assert_eq!(msg.device_id.as_str(), "r1");
        assert_eq!(msg.sample.value, MetricValue::Number(42.0));
        assert_eq!(msg.meta.display_name.as_deref(), Some("Core"));
        assert_eq!(msg.meta.vendor.as_deref(), Some("mikrotik"));
    }

    #[test]
    fn test_metric_falls_back_to_router_id() {
        let raw = r#"{"router_id":"sw3","metric":"if_table","value":[{"ifIndex":1}],"timestamp":"t"}"#;
        let msg = InboundMessage::parse(raw).unwrap();
        assert_eq!(msg.device_id().as_str(), "sw3");
        let InboundMessage::Metric(msg) = msg else {
            panic!("expected metric");
        };
        assert!(matches!(msg.sample.value, MetricValue::List(ref rows) if rows.len() == 1));
    }

    #[test]
    fn test_missing_timestamp_is_stamped() {
        let raw = r#"{"device_id":"r1","metric":"status","value":"ok"}"#;
        let InboundMessage::Metric(msg) = InboundMessage::parse(raw).unwrap() else {
            panic!("expected metric");
        };
        assert!(chrono::DateTime::parse_from_rfc3339(&msg.sample.timestamp).is_ok());
    }

    #[test]
    fn test_link_event_with_device_id() {
        let raw = json!({
            "event": "link_down",
            "device_id": "r1",
            "router_name": "Core",
            "router_ip": "10.0.0.1",
            "interface_index": 3,
            "interface_name": "ether3",
            "admin_status": 1,
            "oper_status": 2,
            "timestamp": "2024-05-01T12:00:00Z",
            "trap_oid": "1.3.6.1.6.3.1.1.5.3"
        })
        .to_string();

        let InboundMessage::Link(event) = InboundMessage::parse(&raw).unwrap() else {
            panic!("expected link event");
        };
        assert_eq!(event.router_id.as_str(), "r1");
        assert_eq!(event.event, LinkEvent::LinkDown);
        assert_eq!(event.interface_index, 3);
        assert_eq!(event.oper_status, 2);
    }

    #[test]
    fn test_other_event_tags_are_metrics() {
        let raw = r#"{"event":"heartbeat","device_id":"r1","metric":"uptime","value":10,"timestamp":"t"}"#;
        assert!(matches!(
            InboundMessage::parse(raw).unwrap(),
            InboundMessage::Metric(_)
        ));
    }

    #[test]
    fn test_malformed_messages_are_protocol_errors() {
        for raw in [
            "not json",
            "[1,2,3]",
            r#"{"metric":"cpu","value":1}"#,
            r#"{"device_id":"r1","value":1}"#,
            r#"{"device_id":"r1","metric":"cpu","value":null}"#,
            r#"{"event":"link_up","interface_index":1}"#,
        ] {
            let err = InboundMessage::parse(raw).unwrap_err();
            assert_eq!(err.kind, ErrorKind::Protocol, "input: {raw}");
        }
    }
}
