//! Credential configuration.

use serde::{Deserialize, Serialize};

use crate::types::credential::CredentialSlot;

/// Bearer credential supplied to the client.
///
/// The token is normally provided through `NETPULSE__AUTH__TOKEN` rather than
/// a file on disk.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Previously issued bearer token.
    #[serde(default)]
    pub token: Option<String>,
}

impl AuthConfig {
    /// Build a credential slot seeded with the configured token.
    pub fn credential_slot(&self) -> CredentialSlot {
        CredentialSlot::with_token(self.token.clone())
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &self.token.as_ref().map(|_| "***"))
            .finish()
    }
}
