//! Handshake watchdog for opening the push channel.

use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use netpulse_core::error::AppError;

/// An open push channel.
pub type ChannelStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Open a channel, failing if the handshake neither completes nor errors
/// within `deadline`.
///
/// On timeout the pending handshake future is dropped, which closes the
/// underlying socket.
pub async fn open_with_watchdog(url: &str, deadline: Duration) -> Result<ChannelStream, AppError> {
    match time::timeout(deadline, connect_async(url)).await {
        Ok(Ok((stream, response))) => {
            tracing::debug!(status = %response.status(), "Push channel handshake complete");
            Ok(stream)
        }
        Ok(Err(e)) => Err(AppError::from(e)),
        Err(_) => {
            tracing::warn!(
                "Push channel handshake did not complete within {:?}",
                deadline
            );
            Err(AppError::timeout(format!(
                "Push channel did not open within {} ms",
                deadline.as_millis()
            )))
        }
    }
}
