//! Progress snapshot published while a download runs.

use std::time::{Duration, Instant};

use crate::calculator::DownloadTimeCalculator;

/// Snapshot of one download's progress (CLI-friendly).
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadProgress {
    /// Declared size in bytes; 0 when unknown.
    pub total_bytes: u64,
    /// Bytes received so far.
    pub bytes_received: u64,
    /// Whole percent in [0, 100]; `None` when the size is unknown.
    pub progress_percentage: Option<u8>,
    /// Speed from the calculator's last recomputation.
    pub bytes_per_sec: f64,
    /// Time since the download started.
    pub elapsed: Duration,
    /// Projected time to completion, if known.
    pub remaining: Option<Duration>,
}

impl DownloadProgress {
    /// Build a snapshot from the calculator state at `now`.
    pub fn from_calculator(calc: &DownloadTimeCalculator, bytes_received: u64, now: Instant) -> Self {
        let total_bytes = calc.total_bytes();
        Self {
            total_bytes,
            bytes_received,
            progress_percentage: percentage(bytes_received, total_bytes),
            bytes_per_sec: calc.download_speed(),
            elapsed: calc.elapsed_at(now),
            remaining: calc.remaining_download_time(),
        }
    }

    /// Fraction complete in [0.0, 1.0]; `None` when the size is unknown.
    pub fn fraction(&self) -> Option<f64> {
        if self.total_bytes == 0 {
            return None;
        }
        Some((self.bytes_received as f64 / self.total_bytes as f64).min(1.0))
    }

    pub fn is_complete(&self) -> bool {
        self.total_bytes > 0 && self.bytes_received >= self.total_bytes
    }
}

/// `bytes_received * 100 / total_bytes`, clamped to 100.
pub fn percentage(bytes_received: u64, total_bytes: u64) -> Option<u8> {
    if total_bytes == 0 {
        return None;
    }
    let pct = (bytes_received as u128 * 100 / total_bytes as u128).min(100);
    Some(pct as u8)
}
