//! Idempotent start/stop calls against the collection control API.

use std::fmt;
use std::sync::RwLock;

use reqwest::{Client, Url};
use serde_json::Value;
use tracing::{info, warn};

use netpulse_core::config::ControlConfig;
use netpulse_core::error::AppError;
use netpulse_core::result::AppResult;
use netpulse_core::types::{CredentialSlot, DeviceId};

/// Control operation on server-side collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionAction {
    /// `POST /collection/start/{device_id}`
    Start,
    /// `POST /collection/stop/{device_id}`
    Stop,
}

impl CollectionAction {
    /// Path segment of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
        }
    }
}

impl fmt::Display for CollectionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Issues start/stop collection requests, independent of channel state.
///
/// Calls are never retried automatically.
#[derive(Debug)]
pub struct CollectionController {
    client: Client,
    base_url: Url,
    credentials: CredentialSlot,
    last_error: RwLock<Option<AppError>>,
}

impl CollectionController {
    /// Creates a controller for the configured control API.
    pub fn new(config: &ControlConfig, credentials: CredentialSlot) -> AppResult<Self> {
        let base_url = Url::parse(&config.api_url)
            .map_err(|e| AppError::configuration(format!("Invalid control API URL: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::configuration(format!(
                "Control API URL cannot be a base: {}",
                config.api_url
            )));
        }
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            credentials,
            last_error: RwLock::new(None),
        })
    }

    /// Starts collection for a device. `false` on any failure; see
    /// [`last_error`](Self::last_error).
    pub async fn start(&self, device_id: &DeviceId) -> bool {
        self.run(CollectionAction::Start, device_id).await
    }

    /// Stops collection for a device. `false` on any failure; see
    /// [`last_error`](Self::last_error).
    pub async fn stop(&self, device_id: &DeviceId) -> bool {
        self.run(CollectionAction::Stop, device_id).await
    }

    /// Starts collection, returning the error instead of recording it.
    pub async fn try_start(&self, device_id: &DeviceId) -> AppResult<()> {
        self.request(CollectionAction::Start, device_id).await
    }

    /// Stops collection, returning the error instead of recording it.
    pub async fn try_stop(&self, device_id: &DeviceId) -> AppResult<()> {
        self.request(CollectionAction::Stop, device_id).await
    }

    /// Error from the most recent call, cleared by the next success.
    pub fn last_error(&self) -> Option<AppError> {
        self.last_error
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    async fn run(&self, action: CollectionAction, device_id: &DeviceId) -> bool {
        let outcome = self.request(action, device_id).await;
        let mut last_error = self.last_error.write().unwrap_or_else(|e| e.into_inner());
        match outcome {
            Ok(()) => {
                *last_error = None;
                true
            }
            Err(e) => {
                warn!(device_id = %device_id, action = %action, error = %e, "Collection request failed");
                *last_error = Some(e);
                false
            }
        }
    }

    async fn request(&self, action: CollectionAction, device_id: &DeviceId) -> AppResult<()> {
        if device_id.is_empty() {
            return Err(AppError::precondition("Device id is required"));
        }
        let credential = self
            .credentials
            .get()
            .ok_or_else(|| AppError::precondition("No credential available"))?;

        let url = self.endpoint(action, device_id)?;
        let response = self
            .client
            .post(url)
            .header(reqwest::header::AUTHORIZATION, credential.bearer())
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            info!(device_id = %device_id, action = %action, "Collection request accepted");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(AppError::remote(
            status.as_u16(),
            format!(
                "Collection {action} rejected with {status}: {}",
                error_detail(&body)
            ),
        ))
    }

    /// `{api_url}/collection/{action}/{device_id}`, with the id percent-encoded.
    fn endpoint(&self, action: CollectionAction, device_id: &DeviceId) -> AppResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::configuration("Control API URL cannot be a base"))?
            .pop_if_empty()
            .extend(["collection", action.as_str(), device_id.as_str()]);
        Ok(url)
    }
}

/// Pulls a human-readable message out of a JSON error body.
fn error_detail(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => ["detail", "message", "error"]
            .iter()
            .find_map(|key| value.get(*key).and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| value.to_string()),
        Err(_) if body.trim().is_empty() => "no details".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netpulse_core::error::ErrorKind;

    fn controller(api_url: &str, token: Option<&str>) -> CollectionController {
        let config = ControlConfig {
            api_url: api_url.to_string(),
            request_timeout_seconds: 5,
        };
        CollectionController::new(&config, CredentialSlot::with_token(token.map(String::from)))
            .unwrap()
    }

    #[test]
    fn test_endpoint_layout() {
        let c = controller("http://localhost:8000/api/", Some("t"));
        let url = c
            .endpoint(CollectionAction::Start, &DeviceId::new("edge 1/a"))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/api/collection/start/edge%201%2Fa"
        );
    }

    #[test]
    fn test_error_detail_extraction() {
        assert_eq!(error_detail(r#"{"detail":"device not found"}"#), "device not found");
        assert_eq!(error_detail(r#"{"message":"busy"}"#), "busy");
        assert_eq!(error_detail("plain failure"), "plain failure");
        assert_eq!(error_detail(""), "no details");
    }

    #[tokio::test]
    async fn test_missing_credential_is_precondition() {
        // Port 9 (discard) is never contacted: the precondition fails first.
        let c = controller("http://127.0.0.1:9/api", None);
        assert!(!c.start(&DeviceId::new("r1")).await);
        assert_eq!(c.last_error().unwrap().kind, ErrorKind::Precondition);
    }

    #[tokio::test]
    async fn test_missing_device_is_precondition() {
        let c = controller("http://127.0.0.1:9/api", Some("t"));
        let err = c.try_stop(&DeviceId::new("")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Precondition);
    }

    #[test]
    fn test_rejects_non_base_url() {
        let config = ControlConfig {
            api_url: "mailto:noc@example.net".to_string(),
            request_timeout_seconds: 5,
        };
        let err = CollectionController::new(&config, CredentialSlot::empty()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }
}
