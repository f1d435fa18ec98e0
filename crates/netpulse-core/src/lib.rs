//! # netpulse-core
//!
//! Core crate for NetPulse. Contains configuration schemas, typed device
//! identifiers, the credential holder shared by the channel and control
//! clients, and the unified error system.
//!
//! This crate has **no** internal dependencies on other NetPulse crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
