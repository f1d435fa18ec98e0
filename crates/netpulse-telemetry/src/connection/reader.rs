//! Reader task: pulls frames off an open channel and hands them to the
//! manager in arrival order.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::time;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use netpulse_core::error::AppError;

use super::handle::ChannelHandle;
use super::manager::Shared;
use super::watchdog::ChannelStream;

/// Time allowed for the close handshake when the client closes the channel.
const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Why a channel stopped delivering.
#[derive(Debug)]
pub(crate) enum CloseReason {
    /// The backend sent a close frame or the stream ended.
    Remote,
    /// Reading failed.
    Failed(AppError),
}

/// Spawn the reader for a freshly opened channel.
pub(crate) fn spawn(shared: Arc<Shared>, stream: ChannelStream, generation: u64) -> ChannelHandle {
    let cancel = CancellationToken::new();
    let task = tokio::spawn(run(shared, stream, generation, cancel.clone()));
    ChannelHandle::new(cancel, task)
}

async fn run(
    shared: Arc<Shared>,
    mut stream: ChannelStream,
    generation: u64,
    cancel: CancellationToken,
) {
    let reason = loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                if time::timeout(CLOSE_GRACE, stream.close(None)).await.is_err() {
                    debug!(generation, "Close handshake timed out");
                }
                return;
            }

            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    if !shared.deliver(generation, text.as_str()) {
                        return;
                    }
                }
                Some(Ok(Message::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                    Ok(text) => {
                        if !shared.deliver(generation, text) {
                            return;
                        }
                    }
                    Err(_) => {
                        let error = AppError::protocol("Binary frame is not UTF-8 JSON");
                        if !shared.reject(generation, error) {
                            return;
                        }
                    }
                },
                Some(Ok(Message::Close(frame))) => {
                    debug!(generation, ?frame, "Backend closed push channel");
                    break CloseReason::Remote;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(generation, error = %e, "Push channel read failed");
                    break CloseReason::Failed(AppError::from(e));
                }
                None => break CloseReason::Remote,
            },
        }
    };

    shared.on_channel_closed(generation, reason);
}
