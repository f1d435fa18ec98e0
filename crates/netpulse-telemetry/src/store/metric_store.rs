//! In-memory metric store.

use std::collections::{HashMap, VecDeque};

use chrono::Utc;
use tracing::trace;

use netpulse_core::types::DeviceId;

use super::device::{DeviceMeta, DeviceState, MetricSample};

/// Per-device, per-metric bounded history.
///
/// Each metric list holds at most `max_data_points` samples in arrival order,
/// evicting the oldest first, and never two samples with the same
/// `(timestamp, value)`.
#[derive(Debug)]
pub struct MetricStore {
    devices: HashMap<DeviceId, DeviceState>,
    max_data_points: usize,
}

impl MetricStore {
    /// Create a store keeping `max_data_points` samples per metric (at least one).
    pub fn new(max_data_points: usize) -> Self {
        Self {
            devices: HashMap::new(),
            max_data_points: max_data_points.max(1),
        }
    }

    /// Capacity of each metric list.
    pub fn max_data_points(&self) -> usize {
        self.max_data_points
    }

    /// Record a sample for a device.
    ///
    /// Returns `false` when the sample duplicated one already held.
    pub fn ingest(&mut self, device_id: &DeviceId, sample: MetricSample) -> bool {
        let state = self
            .devices
            .entry(device_id.clone())
            .or_insert_with(|| DeviceState::new(device_id.clone()));
        state.last_update = Utc::now();

        let samples = state
            .metrics
            .entry(sample.metric.clone())
            .or_insert_with(VecDeque::new);

        if samples.iter().any(|existing| existing.same_reading(&sample)) {
            trace!(device_id = %device_id, metric = %sample.metric, "Duplicate sample ignored");
            return false;
        }

        samples.push_back(sample);
        while samples.len() > self.max_data_points {
            samples.pop_front();
        }
        true
    }

    /// Record descriptive fields for a device, creating it if needed.
    pub fn annotate(&mut self, device_id: &DeviceId, meta: &DeviceMeta) {
        self.devices
            .entry(device_id.clone())
            .or_insert_with(|| DeviceState::new(device_id.clone()))
            .apply_meta(meta);
    }

    /// History of one metric, oldest first. Empty when unknown.
    pub fn get(&self, device_id: &str, metric: &str) -> Vec<MetricSample> {
        self.devices
            .get(device_id)
            .map(|state| state.history(metric))
            .unwrap_or_default()
    }

    /// Most recent sample of one metric.
    pub fn latest(&self, device_id: &str, metric: &str) -> Option<MetricSample> {
        self.devices
            .get(device_id)
            .and_then(|state| state.metrics.get(metric))
            .and_then(|samples| samples.back().cloned())
    }

    /// Snapshot of one device.
    pub fn device(&self, device_id: &str) -> Option<DeviceState> {
        self.devices.get(device_id).cloned()
    }

    /// Metric names recorded for a device, sorted.
    pub fn metric_names(&self, device_id: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .devices
            .get(device_id)
            .map(|state| state.metrics.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    /// All known device ids, sorted.
    pub fn list(&self) -> Vec<DeviceId> {
        let mut ids: Vec<DeviceId> = self.devices.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Snapshots of every known device.
    pub fn all(&self) -> Vec<DeviceState> {
        self.devices.values().cloned().collect()
    }

    /// Number of known devices.
    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    /// Drop all device state.
    pub fn clear(&mut self) {
        self.devices.clear();
    }
}

impl Default for MetricStore {
    fn default() -> Self {
        Self::new(50)
    }
}
