//! Download status machine.
//!
//! `NotStarted -> Downloading -> {Completed | Cancelled | Broken}`. Transitions
//! only move forward; terminal states accept nothing.

use std::fmt;

/// Lifecycle state of a download session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DownloadStatus {
    #[default]
    NotStarted,
    Downloading,
    Cancelled,
    Broken,
    Completed,
}

impl DownloadStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            DownloadStatus::Completed | DownloadStatus::Cancelled | DownloadStatus::Broken
        )
    }

    /// True if `self -> next` is an allowed edge.
    pub fn can_transition_to(self, next: DownloadStatus) -> bool {
        matches!(
            (self, next),
            (DownloadStatus::NotStarted, DownloadStatus::Downloading)
                | (
                    DownloadStatus::Downloading,
                    DownloadStatus::Completed | DownloadStatus::Cancelled | DownloadStatus::Broken
                )
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DownloadStatus::NotStarted => "not_started",
            DownloadStatus::Downloading => "downloading",
            DownloadStatus::Cancelled => "cancelled",
            DownloadStatus::Broken => "broken",
            DownloadStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An accepted transition, published as a status-changed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub previous: DownloadStatus,
    pub current: DownloadStatus,
}

/// A rejected transition. The machine state is left unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid status transition {from} -> {to}")]
pub struct TransitionError {
    pub from: DownloadStatus,
    pub to: DownloadStatus,
}

/// Owner of a session's current status.
#[derive(Debug, Default)]
pub struct StatusMachine {
    current: DownloadStatus,
}

impl StatusMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> DownloadStatus {
        self.current
    }

    pub fn transition(&mut self, next: DownloadStatus) -> Result<StatusChange, TransitionError> {
        if !self.current.can_transition_to(next) {
            return Err(TransitionError {
                from: self.current,
                to: next,
            });
        }
        let change = StatusChange {
            previous: self.current,
            current: next,
        };
        self.current = next;
        tracing::debug!(from = %change.previous, to = %change.current, "download status changed");
        Ok(change)
    }
}
