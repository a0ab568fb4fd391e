//! Terminal rendering of progress and summaries.

use std::time::Duration;

use fetchmeter_core::{DownloadProgress, DownloadStatus, DownloadSummary};

const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];

/// Human-readable byte count with binary units: `512 B`, `1.5 MiB`.
pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

pub fn format_rate(bytes_per_sec: f64) -> String {
    format!("{}/s", format_bytes(bytes_per_sec.max(0.0) as u64))
}

/// Compact duration: `45s`, `3m07s`, `2h05m`.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    match (secs / 3600, (secs % 3600) / 60, secs % 60) {
        (0, 0, s) => format!("{}s", s),
        (0, m, s) => format!("{}m{:02}s", m, s),
        (h, m, _) => format!("{}h{:02}m", h, m),
    }
}

pub fn progress_line(p: &DownloadProgress) -> String {
    let eta = p
        .remaining
        .map(format_duration)
        .unwrap_or_else(|| "?".to_string());
    let done = match p.progress_percentage {
        Some(pct) => format!(
            "{} / {} ({}%)",
            format_bytes(p.bytes_received),
            format_bytes(p.total_bytes),
            pct
        ),
        None => format_bytes(p.bytes_received),
    };
    format!(
        "  {}  {}  ETA {}  elapsed {}",
        done,
        format_rate(p.bytes_per_sec),
        eta,
        format_duration(p.elapsed)
    )
}

pub fn summary_line<T>(s: &DownloadSummary<T>) -> String {
    let head = match s.status {
        DownloadStatus::Completed => format!("saved {}", s.path.display()),
        DownloadStatus::Cancelled => "cancelled".to_string(),
        _ => format!(
            "failed: {}",
            s.error.as_deref().unwrap_or("unknown error")
        ),
    };
    format!(
        "{}  ({} in {}, avg {})",
        head,
        format_bytes(s.bytes_received),
        format_duration(s.elapsed),
        format_rate(s.average_speed)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn bytes_units() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1536), "1.5 KiB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MiB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3.0 GiB");
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(Duration::from_secs(0)), "0s");
        assert_eq!(format_duration(Duration::from_millis(45_900)), "45s");
        assert_eq!(format_duration(Duration::from_secs(187)), "3m07s");
        assert_eq!(format_duration(Duration::from_secs(2 * 3600 + 5 * 60 + 9)), "2h05m");
    }

    #[test]
    fn progress_known_and_unknown_size() {
        let mut p = DownloadProgress {
            total_bytes: 2 * 1024 * 1024,
            bytes_received: 1024 * 1024,
            progress_percentage: Some(50),
            bytes_per_sec: 256.0 * 1024.0,
            elapsed: Duration::from_secs(4),
            remaining: Some(Duration::from_secs(4)),
        };
        assert_eq!(
            progress_line(&p),
            "  1.0 MiB / 2.0 MiB (50%)  256.0 KiB/s  ETA 4s  elapsed 4s"
        );

        p.total_bytes = 0;
        p.progress_percentage = None;
        p.remaining = None;
        assert_eq!(
            progress_line(&p),
            "  1.0 MiB  256.0 KiB/s  ETA ?  elapsed 4s"
        );
    }

    #[test]
    fn summary_lines() {
        let mut s = DownloadSummary {
            status: DownloadStatus::Completed,
            average_speed: 2048.0,
            elapsed: Duration::from_secs(2),
            bytes_received: 4096,
            cancelled: false,
            error: None,
            path: PathBuf::from("/tmp/a.bin"),
            user_state: (),
        };
        assert_eq!(
            summary_line(&s),
            "saved /tmp/a.bin  (4.0 KiB in 2s, avg 2.0 KiB/s)"
        );
        s.status = DownloadStatus::Broken;
        s.error = Some("HTTP 404".into());
        assert!(summary_line(&s).starts_with("failed: HTTP 404"));
        s.status = DownloadStatus::Cancelled;
        assert!(summary_line(&s).starts_with("cancelled"));
    }
}
