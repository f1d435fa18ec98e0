//! Inbound push-channel message classification and validation.

pub mod types;
pub mod validator;

pub use types::{InboundMessage, MetricMessage};
