//! # netpulse-telemetry
//!
//! Live telemetry client for NetPulse. Provides:
//!
//! - A per-device push channel with a connect watchdog and reconnect-on-drop
//! - A bounded, deduplicated in-memory metric store
//! - Bounded link-event logs with running statistics, one per observer
//! - Start/stop control of server-side collection

pub mod collection;
pub mod connection;
pub mod message;
pub mod metrics;
pub mod store;
pub mod trap;

pub use collection::controller::CollectionController;
pub use connection::manager::ConnectionManager;
pub use connection::state::ConnectionState;
pub use store::metric_store::MetricStore;
pub use trap::log::{SharedTrapLog, TrapEventLog};
