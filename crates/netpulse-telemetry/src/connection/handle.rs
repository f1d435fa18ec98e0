//! Owned handle to a running push channel.

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Ownership of one open channel and the task reading from it.
///
/// Dropping the handle cancels the reader, which sends a close frame and
/// exits without delivering further messages. Cancellation is idempotent, so
/// the handle may be dropped after the reader already finished on its own.
#[derive(Debug)]
pub(crate) struct ChannelHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
    opened_at: DateTime<Utc>,
}

impl ChannelHandle {
    pub(crate) fn new(cancel: CancellationToken, task: JoinHandle<()>) -> Self {
        Self {
            cancel,
            task,
            opened_at: Utc::now(),
        }
    }

    /// When the channel opened.
    pub(crate) fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    /// Whether the reader task is still running.
    pub(crate) fn is_alive(&self) -> bool {
        !self.task.is_finished()
    }

    /// Close the channel.
    pub(crate) fn close(self) {
        drop(self);
    }
}

impl Drop for ChannelHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
