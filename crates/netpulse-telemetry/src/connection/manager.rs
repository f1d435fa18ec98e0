//! Connection manager. Owns the push channel for one `(device, vendor)`
//! target and routes inbound messages to the metric store and event
//! observers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use netpulse_core::config::{AppConfig, ChannelConfig};
use netpulse_core::error::AppError;
use netpulse_core::types::{Credential, CredentialSlot, DeviceId};

use crate::message::types::InboundMessage;
use crate::metrics::{ChannelMetrics, MetricsSnapshot, connections, messages};
use crate::store::{DeviceState, MetricSample, MetricStore};
use crate::trap::{EventObserver, ObserverId, ObserverRegistry};

use super::handle::ChannelHandle;
use super::reader::{self, CloseReason};
use super::state::ConnectionState;
use super::watchdog::open_with_watchdog;

/// The logical target of a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Device whose telemetry is streamed.
    pub device_id: DeviceId,
    /// Vendor sent with the subscription.
    pub vendor: String,
}

/// Mutable session bookkeeping, guarded by one lock.
#[derive(Debug, Default)]
struct Session {
    /// Last requested target; reused by reconnects.
    target: Option<Target>,
    /// Bumped by every `connect` and `disconnect`; stale readers and timers
    /// compare against it and stand down.
    generation: u64,
    /// The open channel, if any.
    channel: Option<ChannelHandle>,
    /// Pending reconnect timer.
    reconnect: Option<JoinHandle<()>>,
    /// Cleared by an explicit `disconnect`.
    reconnect_allowed: bool,
    /// Set once by teardown.
    shut_down: bool,
}

impl Session {
    fn cancel_reconnect(&mut self) {
        if let Some(timer) = self.reconnect.take() {
            timer.abort();
        }
    }

    fn close_channel(&mut self) {
        if let Some(channel) = self.channel.take() {
            channel.close();
        }
    }
}

/// Resets the in-flight flag when a connection attempt ends.
struct AttemptGuard<'a>(&'a AtomicBool);

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Settles a handshake whose `connect` future was dropped before it finished.
struct PendingOpen<'a> {
    shared: &'a Shared,
    generation: u64,
    settled: bool,
}

impl PendingOpen<'_> {
    fn settle(&mut self) {
        self.settled = true;
    }
}

impl Drop for PendingOpen<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let session = self.shared.lock_session();
        if session.generation != self.generation || session.shut_down {
            return;
        }
        self.shared.set_state(ConnectionState::Disconnected);
        self.shared
            .record_error(AppError::transport("Connection attempt cancelled"));
        debug!(generation = self.generation, "Connection attempt cancelled");
    }
}

/// State shared between the manager, its reader task, and its reconnect timer.
pub(crate) struct Shared {
    config: ChannelConfig,
    credentials: CredentialSlot,
    state: watch::Sender<ConnectionState>,
    attempt_in_flight: AtomicBool,
    session: Mutex<Session>,
    store: RwLock<MetricStore>,
    observers: ObserverRegistry,
    last_error: RwLock<Option<AppError>>,
    metrics: ChannelMetrics,
}

/// Maintains at most one push channel and reconnects after unexpected loss.
///
/// All channel and timer callbacks run serially with respect to each other.
/// `connect` and `disconnect` may be called concurrently; overlapping
/// `connect` calls never open two channels. Dropping the manager closes the
/// channel, cancels timers, and guarantees no further message is delivered.
pub struct ConnectionManager {
    shared: Arc<Shared>,
}

impl ConnectionManager {
    /// Creates a manager.
    pub fn new(config: ChannelConfig, max_data_points: usize, credentials: CredentialSlot) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            shared: Arc::new(Shared {
                config,
                credentials,
                state,
                attempt_in_flight: AtomicBool::new(false),
                session: Mutex::new(Session::default()),
                store: RwLock::new(MetricStore::new(max_data_points)),
                observers: ObserverRegistry::new(),
                last_error: RwLock::new(None),
                metrics: ChannelMetrics::new(),
            }),
        }
    }

    /// Creates a manager from application configuration.
    pub fn from_config(config: &AppConfig, credentials: CredentialSlot) -> Self {
        Self::new(
            config.channel.clone(),
            config.history.max_data_points,
            credentials,
        )
    }

    /// Opens the channel for `device_id`.
    ///
    /// Returns `true` immediately if already connected to the same target,
    /// and `false` if another attempt is in flight. An empty `vendor` falls
    /// back to the configured one. Failures are recorded in
    /// [`last_error`](Self::last_error).
    pub async fn connect(&self, device_id: &DeviceId, vendor: &str) -> bool {
        let vendor = if vendor.trim().is_empty() {
            self.shared.config.vendor.clone()
        } else {
            vendor.to_string()
        };
        self.shared
            .connect(Target {
                device_id: device_id.clone(),
                vendor,
            })
            .await
    }

    /// Closes the channel and cancels any pending reconnect.
    ///
    /// Safe to call repeatedly or before any connection succeeded.
    pub fn disconnect(&self) {
        self.shared.disconnect();
    }

    /// Tears the manager down. Equivalent to dropping it.
    pub fn shutdown(&self) {
        self.shared.shutdown();
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.shared.state.borrow()
    }

    /// Whether a channel is open.
    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Receiver that observes every state transition.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state.subscribe()
    }

    /// Most recent connection or protocol error, cleared by the next
    /// successful connect.
    pub fn last_error(&self) -> Option<AppError> {
        self.shared
            .last_error
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Last requested target.
    pub fn target(&self) -> Option<Target> {
        self.shared.lock_session().target.clone()
    }

    /// When the open channel was established, if one is open.
    pub fn connected_since(&self) -> Option<DateTime<Utc>> {
        self.shared
            .lock_session()
            .channel
            .as_ref()
            .filter(|channel| channel.is_alive())
            .map(|channel| channel.opened_at())
    }

    /// Registers an event observer.
    ///
    /// Observers run on the message-handling path and must not call back
    /// into the manager.
    pub fn subscribe_events(&self, observer: Arc<dyn EventObserver>) -> ObserverId {
        self.shared.observers.subscribe(observer)
    }

    /// Removes an event observer.
    pub fn unsubscribe_events(&self, id: &ObserverId) -> bool {
        self.shared.observers.unsubscribe(id)
    }

    /// Number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.shared.observers.len()
    }

    /// History of one metric for one device, oldest first.
    pub fn history(&self, device_id: &str, metric: &str) -> Vec<MetricSample> {
        self.shared.read_store().get(device_id, metric)
    }

    /// Snapshot of one device.
    pub fn device(&self, device_id: &str) -> Option<DeviceState> {
        self.shared.read_store().device(device_id)
    }

    /// Ids of every device seen on the channel.
    pub fn devices(&self) -> Vec<DeviceId> {
        self.shared.read_store().list()
    }

    /// Snapshots of every device seen on the channel.
    pub fn all_devices(&self) -> Vec<DeviceState> {
        self.shared.read_store().all()
    }

    /// Runs `f` against the metric store under a read lock.
    pub fn with_store<R>(&self, f: impl FnOnce(&MetricStore) -> R) -> R {
        f(&self.shared.read_store())
    }

    /// Drops all stored device state.
    pub fn clear_store(&self) {
        self.shared
            .store
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    /// Channel counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.shared.metrics.snapshot()
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.shared.shutdown();
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("state", &self.state())
            .field("target", &self.target())
            .field("observers", &self.observer_count())
            .finish()
    }
}

impl Shared {
    fn lock_session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn read_store(&self) -> std::sync::RwLockReadGuard<'_, MetricStore> {
        self.store.read().unwrap_or_else(|e| e.into_inner())
    }

    fn set_state(&self, state: ConnectionState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            debug!(from = %previous, to = %state, "Connection state changed");
        }
    }

    fn record_error(&self, error: AppError) {
        *self.last_error.write().unwrap_or_else(|e| e.into_inner()) = Some(error);
    }

    fn clear_error(&self) {
        *self.last_error.write().unwrap_or_else(|e| e.into_inner()) = None;
    }

    fn channel_url(&self, target: &Target, credential: &Credential) -> Result<reqwest::Url, AppError> {
        reqwest::Url::parse_with_params(
            &self.config.url,
            &[
                ("device_id", target.device_id.as_str()),
                ("vendor", target.vendor.as_str()),
                ("token", credential.expose()),
            ],
        )
        .map_err(|e| AppError::configuration(format!("Invalid channel URL: {e}")))
    }

    async fn connect(self: &Arc<Self>, target: Target) -> bool {
        if target.device_id.is_empty() {
            self.record_error(AppError::precondition("Device id is required"));
            return false;
        }

        {
            let session = self.lock_session();
            if session.shut_down {
                return false;
            }
            if *self.state.borrow() == ConnectionState::Connected
                && session.target.as_ref() == Some(&target)
            {
                return true;
            }
        }

        if self
            .attempt_in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(device_id = %target.device_id, "Connection attempt already in flight");
            return false;
        }
        let _attempt = AttemptGuard(&self.attempt_in_flight);

        let Some(credential) = self.credentials.get() else {
            self.record_error(AppError::precondition("No credential available"));
            return false;
        };
        let url = match self.channel_url(&target, &credential) {
            Ok(url) => url,
            Err(e) => {
                self.record_error(e);
                return false;
            }
        };

        let generation = {
            let mut session = self.lock_session();
            if session.shut_down {
                return false;
            }
            session.cancel_reconnect();
            session.close_channel();
            session.generation += 1;
            session.target = Some(target.clone());
            session.reconnect_allowed = true;
            self.set_state(ConnectionState::Connecting);
            session.generation
        };

        let mut pending = PendingOpen {
            shared: self,
            generation,
            settled: false,
        };
        connections::record_attempt(&self.metrics);
        info!(
            device_id = %target.device_id,
            vendor = %target.vendor,
            "Opening push channel"
        );

        let opened = open_with_watchdog(url.as_str(), self.config.connect_timeout()).await;
        pending.settle();

        match opened {
            Ok(stream) => {
                let mut session = self.lock_session();
                if session.generation != generation || session.shut_down {
                    debug!(device_id = %target.device_id, "Attempt superseded, discarding channel");
                    return false;
                }
                session.channel = Some(reader::spawn(Arc::clone(self), stream, generation));
                self.set_state(ConnectionState::Connected);
                self.clear_error();
                connections::record_opened(&self.metrics);
                info!(device_id = %target.device_id, "Push channel connected");
                true
            }
            Err(e) => {
                {
                    let session = self.lock_session();
                    if session.generation == generation {
                        self.set_state(ConnectionState::Disconnected);
                    }
                }
                warn!(device_id = %target.device_id, error = %e, "Push channel failed to open");
                self.record_error(e);
                false
            }
        }
    }

    fn connect_owned(self: Arc<Self>, target: Target) -> BoxFuture<'static, bool> {
        Box::pin(async move { self.connect(target).await })
    }

    fn disconnect(&self) {
        let mut session = self.lock_session();
        session.reconnect_allowed = false;
        session.generation += 1;
        session.cancel_reconnect();
        session.close_channel();
        self.set_state(ConnectionState::Disconnected);
        info!("Push channel disconnected");
    }

    fn shutdown(&self) {
        {
            let mut session = self.lock_session();
            if session.shut_down {
                return;
            }
            session.shut_down = true;
            session.reconnect_allowed = false;
            session.generation += 1;
            session.cancel_reconnect();
            session.close_channel();
        }
        self.observers.clear();
        self.set_state(ConnectionState::Disconnected);
        debug!("Connection manager shut down");
    }

    /// Handles one text frame from the reader of `generation`.
    ///
    /// Returns `false` when that reader has been superseded and must stop.
    /// Holding the session lock while dispatching serializes delivery with
    /// `disconnect` and teardown.
    pub(crate) fn deliver(&self, generation: u64, raw: &str) -> bool {
        let session = self.lock_session();
        if session.generation != generation || session.shut_down {
            return false;
        }

        messages::record_received(&self.metrics);
        match InboundMessage::parse(raw) {
            Ok(InboundMessage::Metric(msg)) => {
                let mut store = self.store.write().unwrap_or_else(|e| e.into_inner());
                store.annotate(&msg.device_id, &msg.meta);
                let metric = msg.sample.metric.clone();
                let stored = store.ingest(&msg.device_id, msg.sample);
                messages::record_sample(&self.metrics, stored);
                debug!(device_id = %msg.device_id, metric = %metric, stored, "Metric sample");
            }
            Ok(InboundMessage::Link(event)) => {
                let delivered = self.observers.dispatch(&event);
                messages::record_event(&self.metrics);
                debug!(
                    router_id = %event.router_id,
                    if_index = event.interface_index,
                    event = %event.event,
                    observers = delivered,
                    "Link event"
                );
            }
            Err(e) => self.drop_malformed(generation, e),
        }
        true
    }

    /// Drops a frame the reader of `generation` could not decode.
    ///
    /// Returns `false` when that reader has been superseded and must stop.
    pub(crate) fn reject(&self, generation: u64, error: AppError) -> bool {
        let session = self.lock_session();
        if session.generation != generation || session.shut_down {
            return false;
        }
        self.drop_malformed(generation, error);
        true
    }

    /// Counts and records a malformed frame. The channel stays open.
    fn drop_malformed(&self, generation: u64, error: AppError) {
        warn!(generation, error = %error, "Dropping malformed message");
        messages::record_dropped(&self.metrics);
        self.record_error(error);
    }

    /// Called once by the reader of `generation` when its channel ends
    /// without being closed by the client.
    pub(crate) fn on_channel_closed(self: &Arc<Self>, generation: u64, reason: CloseReason) {
        let mut session = self.lock_session();
        if session.generation != generation || session.shut_down {
            return;
        }

        let was_connected = *self.state.borrow() == ConnectionState::Connected;
        session.channel = None;
        self.set_state(ConnectionState::Disconnected);

        match reason {
            CloseReason::Remote => {
                info!("Push channel closed by backend");
                self.record_error(AppError::transport("Push channel closed by backend"));
            }
            CloseReason::Failed(e) => self.record_error(e),
        }

        if was_connected && session.reconnect_allowed && self.config.auto_reconnect {
            self.schedule_reconnect(&mut session, generation);
        }
    }

    fn schedule_reconnect(self: &Arc<Self>, session: &mut Session, generation: u64) {
        let Some(target) = session.target.clone() else {
            return;
        };
        let delay = self.config.reconnect_interval();
        let shared = Arc::clone(self);

        connections::record_reconnect_scheduled(&self.metrics);
        info!(
            device_id = %target.device_id,
            delay_ms = delay.as_millis() as u64,
            "Scheduling reconnect"
        );

        session.cancel_reconnect();
        session.reconnect = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut session = shared.lock_session();
                if session.generation != generation
                    || !session.reconnect_allowed
                    || session.shut_down
                {
                    return;
                }
                // Detach our own handle so `connect` does not abort this task.
                drop(session.reconnect.take());
            }
            info!(device_id = %target.device_id, "Reconnecting push channel");
            shared.connect_owned(target).await;
        }));
    }
}
