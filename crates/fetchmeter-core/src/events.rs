//! Events published by a download session.
//!
//! The session runs on a blocking thread and pushes events into a
//! `tokio::sync::mpsc` channel. Progress is lossy (`try_send`): a full channel
//! drops the snapshot, a newer one follows. Status changes and the final
//! summary are always delivered while the receiver is alive.

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::progress::DownloadProgress;
use crate::status::{DownloadStatus, StatusChange};

/// Terminal report of a download session.
#[derive(Debug, Clone)]
pub struct DownloadSummary<T> {
    /// Terminal status (`Completed`, `Cancelled` or `Broken`).
    pub status: DownloadStatus,
    /// Bytes received over the whole session divided by elapsed seconds.
    pub average_speed: f64,
    pub elapsed: Duration,
    pub bytes_received: u64,
    pub cancelled: bool,
    /// Transport, HTTP or storage error text when the session broke.
    pub error: Option<String>,
    /// Where the file was (or would have been) written.
    pub path: PathBuf,
    /// Caller-supplied correlation token, passed through untouched.
    pub user_state: T,
}

/// One notification from a running session.
#[derive(Debug, Clone)]
pub enum DownloadEvent<T> {
    Status(StatusChange),
    Progress(DownloadProgress),
    Finished(DownloadSummary<T>),
}

/// Sending half used by the session. `None` when nobody listens.
pub struct EventSender<T> {
    tx: Option<mpsc::Sender<DownloadEvent<T>>>,
}

impl<T> EventSender<T> {
    pub fn new(tx: mpsc::Sender<DownloadEvent<T>>) -> Self {
        Self { tx: Some(tx) }
    }

    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Best effort; dropped if the channel is full.
    pub fn progress(&self, progress: DownloadProgress) {
        if let Some(tx) = &self.tx {
            let _ = tx.try_send(DownloadEvent::Progress(progress));
        }
    }

    /// Waits for room in the channel. Must not be called from an async context.
    pub fn status(&self, change: StatusChange) {
        self.send_blocking(DownloadEvent::Status(change));
    }

    pub fn finished(&self, summary: DownloadSummary<T>) {
        self.send_blocking(DownloadEvent::Finished(summary));
    }

    fn send_blocking(&self, event: DownloadEvent<T>) {
        if let Some(tx) = &self.tx {
            if tx.blocking_send(event).is_err() {
                tracing::debug!("event receiver dropped");
            }
        }
    }
}

/// Average speed in bytes per second (0 when no time has passed).
pub fn average_speed(bytes: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return 0.0;
    }
    bytes as f64 / secs
}
