//! NetPulse telemetry client
//!
//! Starts server-side collection for one device, streams its telemetry over
//! the push channel, and periodically logs what has been received.

use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use netpulse_core::config::{AppConfig, LogFormat};
use netpulse_core::error::AppError;
use netpulse_core::types::DeviceId;
use netpulse_telemetry::{
    CollectionController, ConnectionManager, ConnectionState, SharedTrapLog, TrapEventLog,
};

/// NetPulse: live device telemetry
#[derive(Debug, Parser)]
#[command(name = "netpulse", version, about, long_about = None)]
struct Cli {
    /// Device to stream
    #[arg(short, long)]
    device: String,

    /// Vendor sent with the subscription (defaults to `channel.vendor`)
    #[arg(long, default_value = "")]
    vendor: String,

    /// Configuration environment overlay (`config/{env}.toml`)
    #[arg(short, long, env = "NETPULSE_ENV", default_value = "development")]
    env: String,

    /// Do not start or stop server-side collection
    #[arg(long)]
    no_collect: bool,

    /// Seconds between status reports
    #[arg(long, default_value_t = 30)]
    report_interval: u64,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match AppConfig::load(&cli.env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(cli, config).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        LogFormat::Pretty => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main client run function
async fn run(cli: Cli, config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting NetPulse v{}", env!("CARGO_PKG_VERSION"));

    let device = DeviceId::parse(&cli.device)?;
    let credentials = config.auth.credential_slot();

    // ── Collection ───────────────────────────────────────────────
    let controller = CollectionController::new(&config.control, credentials.clone())?;
    let collecting = !cli.no_collect && controller.start(&device).await;
    if !cli.no_collect && !collecting {
        if let Some(e) = controller.last_error() {
            tracing::warn!("Collection not started for {}: {}", device, e);
        }
    }

    // ── Push channel ─────────────────────────────────────────────
    let manager = ConnectionManager::from_config(&config, credentials);
    let trap_log = TrapEventLog::from_config(&config.history, None).into_shared();
    manager.subscribe_events(trap_log.clone());

    if !manager.connect(&device, &cli.vendor).await {
        let error = manager
            .last_error()
            .unwrap_or_else(|| AppError::internal("Push channel did not open"));
        if collecting {
            controller.stop(&device).await;
        }
        return Err(error);
    }

    // ── Event loop ───────────────────────────────────────────────
    let mut states = manager.watch_state();
    let mut report = tokio::time::interval(Duration::from_secs(cli.report_interval.max(1)));
    report.tick().await;

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Shutdown signal received");
                break;
            }
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *states.borrow_and_update();
                match (state, manager.last_error()) {
                    (ConnectionState::Disconnected, Some(e)) => {
                        tracing::warn!("Push channel {}: {}", state, e);
                    }
                    _ => tracing::info!("Push channel {}", state),
                }
            }
            _ = report.tick() => {
                log_report(&manager, &trap_log, &device);
            }
        }
    }

    // ── Teardown ─────────────────────────────────────────────────
    manager.disconnect();
    if collecting && !controller.stop(&device).await {
        if let Some(e) = controller.last_error() {
            tracing::warn!("Collection not stopped for {}: {}", device, e);
        }
    }
    log_report(&manager, &trap_log, &device);

    tracing::info!("NetPulse client shut down");
    Ok(())
}

/// Log the latest value of every metric and the link-event totals.
fn log_report(manager: &ConnectionManager, trap_log: &SharedTrapLog, device: &DeviceId) {
    manager.with_store(|store| {
        for metric in store.metric_names(device.as_str()) {
            if let Some(sample) = store.latest(device.as_str(), &metric) {
                tracing::info!(
                    device_id = %device,
                    metric = %metric,
                    value = ?sample.value,
                    timestamp = %sample.timestamp,
                    "Latest sample"
                );
            }
        }
    });

    let log = trap_log.read().unwrap_or_else(|e| e.into_inner());
    let stats = log.statistics();
    let counters = manager.metrics();
    tracing::info!(
        messages = counters.messages_received,
        dropped = counters.messages_dropped,
        link_events = stats.total_events,
        link_up = stats.link_up_count,
        link_down = stats.link_down_count,
        "Telemetry report"
    );
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
