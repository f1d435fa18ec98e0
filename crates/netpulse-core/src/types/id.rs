//! Identifier of a monitored device.
//!
//! Device ids are assigned by the monitoring backend and are opaque to the
//! client; they are only compared, hashed, and echoed back in requests.

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Opaque identifier of a monitored router, switch, or transmitter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    /// Wrap a raw identifier without validation.
    ///
    /// Use [`DeviceId::parse`] when the value comes from user input.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Parse a user-supplied identifier, rejecting blank values.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AppError::precondition("Device id is required"));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Return the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier is empty (only possible through [`DeviceId::new`]).
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Consume the wrapper and return the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DeviceId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<&str> for DeviceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for DeviceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for DeviceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for DeviceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_parse_trims() {
        let id = DeviceId::parse("  r1 ").unwrap();
        assert_eq!(id.as_str(), "r1");
    }

    #[test]
    fn test_parse_rejects_blank() {
        let err = DeviceId::parse("   ").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Precondition);
    }

    #[test]
    fn test_borrow_as_map_key() {
        let mut map = std::collections::HashMap::new();
        map.insert(DeviceId::new("r1"), 1);
        assert_eq!(map.get("r1"), Some(&1));
    }
}
