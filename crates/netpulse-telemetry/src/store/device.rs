//! Per-device state and metric sample types.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use netpulse_core::types::DeviceId;

/// Value carried by a metric sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    /// Numeric reading (counters, gauges, percentages).
    Number(f64),
    /// Textual reading (status strings, firmware versions).
    Text(String),
    /// Tabular reading (per-interface lists and similar).
    List(Vec<serde_json::Value>),
}

impl MetricValue {
    /// Numeric value, if this is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for MetricValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// One timestamped measurement of a named metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    /// Metric name, e.g. `cpu_usage`.
    pub metric: String,
    /// Measured value.
    pub value: MetricValue,
    /// ISO-8601 timestamp assigned by the backend.
    pub timestamp: String,
}

impl MetricSample {
    /// Create a sample.
    pub fn new(
        metric: impl Into<String>,
        value: impl Into<MetricValue>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            metric: metric.into(),
            value: value.into(),
            timestamp: timestamp.into(),
        }
    }

    /// Whether two samples describe the same reading.
    pub fn same_reading(&self, other: &MetricSample) -> bool {
        self.timestamp == other.timestamp && self.value == other.value
    }
}

/// Optional descriptive fields carried alongside metric messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceMeta {
    /// Human-readable device name.
    pub display_name: Option<String>,
    /// Device type (router, switch, transmitter).
    pub device_type: Option<String>,
    /// Vendor name.
    pub vendor: Option<String>,
}

/// Everything known about one device seen on the channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceState {
    /// Device identifier.
    pub device_id: DeviceId,
    /// Human-readable name.
    pub display_name: Option<String>,
    /// Device type.
    pub device_type: Option<String>,
    /// Vendor name.
    pub vendor: Option<String>,
    /// Metric name → samples in arrival order.
    pub metrics: HashMap<String, VecDeque<MetricSample>>,
    /// When the last sample for this device arrived.
    pub last_update: DateTime<Utc>,
}

impl DeviceState {
    /// Create an empty state for a newly seen device.
    pub fn new(device_id: DeviceId) -> Self {
        Self {
            device_id,
            display_name: None,
            device_type: None,
            vendor: None,
            metrics: HashMap::new(),
            last_update: Utc::now(),
        }
    }

    /// Overwrite descriptive fields that are present in `meta`.
    pub fn apply_meta(&mut self, meta: &DeviceMeta) {
        if let Some(name) = &meta.display_name {
            self.display_name = Some(name.clone());
        }
        if let Some(kind) = &meta.device_type {
            self.device_type = Some(kind.clone());
        }
        if let Some(vendor) = &meta.vendor {
            self.vendor = Some(vendor.clone());
        }
    }

    /// Samples for one metric, oldest first.
    pub fn history(&self, metric: &str) -> Vec<MetricSample> {
        self.metrics
            .get(metric)
            .map(|samples| samples.iter().cloned().collect())
            .unwrap_or_default()
    }
}
