//! Integration tests for start/stop collection against a mock control API.

mod helpers;

use netpulse_core::config::ControlConfig;
use netpulse_core::error::ErrorKind;
use netpulse_core::types::{Credential, CredentialSlot, DeviceId};
use netpulse_telemetry::CollectionController;

use helpers::{ControlCall, MockControlApi, TOKEN};

fn credentials() -> CredentialSlot {
    CredentialSlot::with_token(Some(TOKEN.to_string()))
}

#[tokio::test]
async fn test_start_and_stop_send_bearer_credential() {
    let api = MockControlApi::start().await;
    let controller = api.controller(credentials());
    let device = DeviceId::new("r1");

    assert!(controller.start(&device).await);
    assert!(controller.stop(&device).await);
    assert!(controller.last_error().is_none());

    let bearer = Some(format!("Bearer {TOKEN}"));
    assert_eq!(
        api.calls(),
        vec![
            ControlCall {
                action: "start".to_string(),
                device_id: "r1".to_string(),
                authorization: bearer.clone(),
            },
            ControlCall {
                action: "stop".to_string(),
                device_id: "r1".to_string(),
                authorization: bearer,
            },
        ]
    );
}

#[tokio::test]
async fn test_repeated_start_is_forwarded_each_time() {
    let api = MockControlApi::start().await;
    let controller = api.controller(credentials());
    let device = DeviceId::new("r1");

    assert!(controller.start(&device).await);
    assert!(controller.start(&device).await);
    assert_eq!(api.calls().len(), 2);
}

#[tokio::test]
async fn test_rejection_reports_status_and_detail() {
    let api = MockControlApi::start().await;
    let controller = api.controller(credentials());

    assert!(!controller.start(&DeviceId::new("missing")).await);

    let err = controller.last_error().unwrap();
    assert_eq!(err.kind, ErrorKind::Remote);
    assert_eq!(err.status, Some(404));
    assert!(err.message.contains("Device not found"));
}

#[tokio::test]
async fn test_success_clears_previous_error() {
    let api = MockControlApi::start().await;
    let controller = api.controller(credentials());

    assert!(!controller.stop(&DeviceId::new("missing")).await);
    assert!(controller.last_error().is_some());
    assert!(controller.stop(&DeviceId::new("r1")).await);
    assert!(controller.last_error().is_none());
}

#[tokio::test]
async fn test_no_credential_makes_no_request() {
    let api = MockControlApi::start().await;
    let controller = api.controller(CredentialSlot::empty());

    assert!(!controller.start(&DeviceId::new("r1")).await);
    assert_eq!(controller.last_error().unwrap().kind, ErrorKind::Precondition);
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_credential_set_later_is_used() {
    let api = MockControlApi::start().await;
    let slot = CredentialSlot::empty();
    let controller = api.controller(slot.clone());

    assert!(!controller.start(&DeviceId::new("r1")).await);
    slot.set(Credential::new("late-token").unwrap());
    assert!(controller.start(&DeviceId::new("r1")).await);

    let calls = api.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].authorization.as_deref(), Some("Bearer late-token"));
}

#[tokio::test]
async fn test_unreachable_api_is_transport_error() {
    let url = helpers::dead_backend().await.replace("ws://", "http://");
    let config = ControlConfig {
        api_url: url,
        request_timeout_seconds: 2,
    };
    let controller = CollectionController::new(&config, credentials()).unwrap();

    let err = controller.try_start(&DeviceId::new("r1")).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Transport);
}
