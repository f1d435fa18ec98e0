//! Core type definitions used across the NetPulse workspace.

pub mod credential;
pub mod id;

pub use credential::{Credential, CredentialSlot};
pub use id::DeviceId;
