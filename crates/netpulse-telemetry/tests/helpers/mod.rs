//! Shared helpers for telemetry integration tests: an in-process WebSocket
//! backend, a backend that never completes the handshake, and a mock
//! control API.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use serde_json::json;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};

use netpulse_core::config::{ChannelConfig, ControlConfig};
use netpulse_core::types::CredentialSlot;
use netpulse_telemetry::{CollectionController, ConnectionManager};

/// Token used by every test client.
pub const TOKEN: &str = "test-token";

/// Server side of an accepted push channel.
pub type ServerSocket = WebSocketStream<TcpStream>;

/// In-process push-channel backend.
pub struct MockBackend {
    /// `ws://` URL of the backend.
    pub url: String,
    sockets: mpsc::UnboundedReceiver<ServerSocket>,
    queries: Arc<Mutex<Vec<String>>>,
    accepted: Arc<AtomicUsize>,
}

impl MockBackend {
    /// Bind on an ephemeral port and start accepting channels.
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, sockets) = mpsc::unbounded_channel();
        let queries = Arc::new(Mutex::new(Vec::new()));
        let accepted = Arc::new(AtomicUsize::new(0));

        let task_queries = queries.clone();
        let task_accepted = accepted.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let queries = task_queries.clone();
                let callback = move |request: &Request,
                                     response: Response|
                      -> Result<Response, ErrorResponse> {
                    queries
                        .lock()
                        .unwrap()
                        .push(request.uri().query().unwrap_or_default().to_string());
                    Ok(response)
                };
                if let Ok(socket) = tokio_tungstenite::accept_hdr_async(stream, callback).await {
                    task_accepted.fetch_add(1, Ordering::SeqCst);
                    let _ = tx.send(socket);
                }
            }
        });

        Self {
            url: format!("ws://{addr}/ws/telemetry"),
            sockets,
            queries,
            accepted,
        }
    }

    /// Wait for the next accepted channel.
    pub async fn next_connection(&mut self) -> ServerSocket {
        tokio::time::timeout(Duration::from_secs(5), self.sockets.recv())
            .await
            .expect("no channel accepted within 5s")
            .expect("backend stopped")
    }

    /// Number of channels that completed the handshake.
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    /// Query strings of every handshake, in order.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

/// A TCP listener that accepts connections but never answers the handshake.
pub async fn silent_backend() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });
    format!("ws://{addr}/ws/telemetry")
}

/// A URL on which nothing listens.
pub async fn dead_backend() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("ws://{addr}/ws/telemetry")
}

/// Channel settings with short timers.
pub fn channel_config(url: &str) -> ChannelConfig {
    ChannelConfig {
        url: url.to_string(),
        vendor: "generic".to_string(),
        reconnect_interval_ms: 200,
        auto_reconnect: true,
        connect_timeout_ms: 2_000,
    }
}

/// Manager with a test credential.
pub fn manager(config: ChannelConfig, max_data_points: usize) -> ConnectionManager {
    ConnectionManager::new(
        config,
        max_data_points,
        CredentialSlot::with_token(Some(TOKEN.to_string())),
    )
}

/// Poll `condition` until it holds, panicking after 5s.
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not met within 5s"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// JSON text of a metric message.
pub fn metric_json(device_id: &str, metric: &str, value: f64, timestamp: &str) -> String {
    json!({
        "device_id": device_id,
        "metric": metric,
        "value": value,
        "timestamp": timestamp,
        "device_name": format!("{device_id} (test)"),
        "device_type": "router",
        "vendor": "mikrotik",
    })
    .to_string()
}

/// JSON text of a link event.
pub fn link_json(router_id: &str, interface_index: u32, event: &str) -> String {
    json!({
        "event": event,
        "router_id": router_id,
        "router_name": format!("{router_id} (test)"),
        "router_ip": "10.0.0.1",
        "interface_index": interface_index,
        "interface_name": format!("ether{interface_index}"),
        "admin_status": 1,
        "oper_status": if event == "link_up" { 1 } else { 2 },
        "timestamp": "2024-05-01T12:00:00Z",
        "trap_oid": "1.3.6.1.6.3.1.1.5.3",
    })
    .to_string()
}

/// One request received by the mock control API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlCall {
    /// `start` or `stop`.
    pub action: String,
    /// Device id from the path.
    pub device_id: String,
    /// Raw `Authorization` header.
    pub authorization: Option<String>,
}

/// Mock control API. Devices named `missing` answer 404.
pub struct MockControlApi {
    /// Base URL (ends in `/api`).
    pub url: String,
    calls: Arc<Mutex<Vec<ControlCall>>>,
}

impl MockControlApi {
    /// Bind on an ephemeral port and start serving.
    pub async fn start() -> Self {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let router = Router::new()
            .route("/api/collection/{action}/{device_id}", post(handle_control))
            .with_state(calls.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Self {
            url: format!("http://{addr}/api"),
            calls,
        }
    }

    /// Requests received so far.
    pub fn calls(&self) -> Vec<ControlCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Controller pointed at this API.
    pub fn controller(&self, credentials: CredentialSlot) -> CollectionController {
        let config = ControlConfig {
            api_url: self.url.clone(),
            request_timeout_seconds: 5,
        };
        CollectionController::new(&config, credentials).unwrap()
    }
}

async fn handle_control(
    State(calls): State<Arc<Mutex<Vec<ControlCall>>>>,
    Path((action, device_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> (StatusCode, axum::Json<serde_json::Value>) {
    calls.lock().unwrap().push(ControlCall {
        action: action.clone(),
        device_id: device_id.clone(),
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(String::from),
    });

    if device_id == "missing" {
        return (
            StatusCode::NOT_FOUND,
            axum::Json(json!({ "detail": "Device not found" })),
        );
    }
    (
        StatusCode::OK,
        axum::Json(json!({ "status": action, "device_id": device_id })),
    )
}
