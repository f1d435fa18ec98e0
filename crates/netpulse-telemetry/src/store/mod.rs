//! Bounded, deduplicated per-device metric history.

pub mod device;
pub mod metric_store;

pub use device::{DeviceMeta, DeviceState, MetricSample, MetricValue};
pub use metric_store::MetricStore;
