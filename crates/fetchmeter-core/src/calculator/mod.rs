//! Download speed and remaining-time estimation.
//!
//! The calculator turns a bursty stream of cumulative byte counts into a
//! (speed, ETA) pair that only changes once per update interval. Between
//! recomputations the previous values are returned unchanged, so a progress
//! display does not jitter on every network chunk.

use std::time::{Duration, Instant};

/// Default spacing between two speed recomputations.
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(2);

/// Baseline of the last recomputation. Time and byte count always move together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FetchMark {
    time: Instant,
    bytes: u64,
}

/// Rate-limited speed/ETA estimator for a single download.
///
/// Single-writer: `update` takes `&mut self`, so sharing it across producers
/// requires wrapping it in a lock that covers the whole update.
#[derive(Debug, Clone)]
pub struct DownloadTimeCalculator {
    start_time: Instant,
    total_bytes: u64,
    update_interval: Duration,
    mark: FetchMark,
    bytes_per_sec: f64,
    remaining: Option<Duration>,
}

impl DownloadTimeCalculator {
    /// Create a calculator for a download that started at `start_time`.
    /// `total_bytes == 0` means the size is unknown and no ETA is produced.
    pub fn new(start_time: Instant, total_bytes: u64) -> Self {
        Self::with_update_interval(start_time, total_bytes, DEFAULT_UPDATE_INTERVAL)
    }

    pub fn with_update_interval(
        start_time: Instant,
        total_bytes: u64,
        update_interval: Duration,
    ) -> Self {
        Self {
            start_time,
            total_bytes,
            update_interval,
            mark: FetchMark {
                time: start_time,
                bytes: 0,
            },
            bytes_per_sec: 0.0,
            remaining: None,
        }
    }

    /// Record a cumulative byte count observed now.
    pub fn update(&mut self, bytes_received: u64) {
        self.update_at(bytes_received, Instant::now());
    }

    /// Record a cumulative byte count observed at `now`.
    pub fn update_at(&mut self, bytes_received: u64, now: Instant) {
        if self.total_bytes > 0 && bytes_received >= self.total_bytes {
            self.bytes_per_sec = 0.0;
            self.remaining = Some(Duration::ZERO);
            return;
        }

        if bytes_received < self.mark.bytes {
            tracing::debug!(
                bytes_received,
                baseline = self.mark.bytes,
                "byte count moved backwards, rebasing speed baseline"
            );
            self.mark = FetchMark {
                time: now,
                bytes: bytes_received,
            };
            return;
        }

        // A clock that went backwards reads as "not yet due".
        let fetch_interval = match now.checked_duration_since(self.mark.time) {
            Some(d) if !d.is_zero() => d,
            _ => return,
        };
        if fetch_interval < self.update_interval {
            return;
        }

        let delta = bytes_received - self.mark.bytes;
        self.bytes_per_sec = delta as f64 / fetch_interval.as_secs_f64();
        if self.total_bytes > 0 {
            self.remaining = remaining_at(self.total_bytes - bytes_received, self.bytes_per_sec);
        }
        self.mark = FetchMark {
            time: now,
            bytes: bytes_received,
        };
    }

    /// Set the size once it becomes known after construction (e.g. from GET
    /// response headers). Ignored when a size is already set.
    pub fn set_total_bytes(&mut self, total_bytes: u64) {
        if self.total_bytes == 0 {
            self.total_bytes = total_bytes;
        }
    }

    /// Time since the download started, read live on every call.
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn elapsed_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.start_time)
    }

    /// Speed in bytes per second from the last recomputation.
    pub fn download_speed(&self) -> f64 {
        self.bytes_per_sec
    }

    /// Remaining time from the last recomputation. `None` until the first
    /// recomputation, when the size is unknown, or when the speed is zero.
    pub fn remaining_download_time(&self) -> Option<Duration> {
        self.remaining
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn start_time(&self) -> Instant {
        self.start_time
    }

    pub fn update_interval(&self) -> Duration {
        self.update_interval
    }
}

/// `remaining_bytes / bytes_per_sec` as a duration, or `None` if the speed is
/// zero or the result does not fit in a `Duration`.
fn remaining_at(remaining_bytes: u64, bytes_per_sec: f64) -> Option<Duration> {
    if bytes_per_sec <= 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(remaining_bytes as f64 / bytes_per_sec).ok()
}
