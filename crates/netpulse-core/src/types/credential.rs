//! Bearer credential attached to channel and control requests.
//!
//! NetPulse never obtains credentials itself; a previously issued token is
//! placed in a [`CredentialSlot`] and read at the moment a request is made,
//! so a refreshed token takes effect without rebuilding the clients.

use std::fmt;
use std::sync::{Arc, RwLock};

/// An opaque bearer token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a token. Blank tokens yield `None`.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            None
        } else {
            Some(Self(token))
        }
    }

    /// The raw token value.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Value for an `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Shared, replaceable holder for the current credential.
#[derive(Debug, Clone, Default)]
pub struct CredentialSlot {
    inner: Arc<RwLock<Option<Credential>>>,
}

impl CredentialSlot {
    /// Create an empty slot.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a slot holding the given token, if it is not blank.
    pub fn with_token(token: Option<String>) -> Self {
        let slot = Self::default();
        if let Some(credential) = token.and_then(Credential::new) {
            slot.set(credential);
        }
        slot
    }

    /// Replace the stored credential.
    pub fn set(&self, credential: Credential) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(credential);
    }

    /// Remove the stored credential.
    pub fn clear(&self) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *guard = None;
    }

    /// Current credential, if any.
    pub fn get(&self) -> Option<Credential> {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_token_is_absent() {
        assert!(Credential::new("  ").is_none());
        assert!(CredentialSlot::with_token(Some(String::new())).get().is_none());
    }

    #[test]
    fn test_debug_redacts() {
        let credential = Credential::new("s3cret").unwrap();
        assert_eq!(format!("{credential:?}"), "Credential(***)");
        assert_eq!(credential.bearer(), "Bearer s3cret");
    }

    #[test]
    fn test_slot_shared_between_clones() {
        let slot = CredentialSlot::empty();
        let other = slot.clone();
        slot.set(Credential::new("abc").unwrap());
        assert_eq!(other.get().unwrap().expose(), "abc");
        other.clear();
        assert!(slot.get().is_none());
    }
}
