use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::calculator::DEFAULT_UPDATE_INTERVAL;

/// Global configuration loaded from `~/.config/fetchmeter/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Minimum spacing in seconds between two speed/ETA recomputations.
    pub update_interval_secs: f64,
    /// Minimum spacing in milliseconds between two published progress events.
    pub progress_interval_ms: u64,
    /// TCP/TLS connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Abort when throughput stays below this many bytes/s ...
    pub low_speed_limit: u32,
    /// ... for this many seconds.
    pub low_speed_time_secs: u64,
    /// Maximum number of redirects followed per request.
    pub max_redirections: u32,
    /// Send a HEAD request before the GET to learn the size and file name.
    #[serde(default = "default_probe_head")]
    pub probe_head: bool,
    /// Optional User-Agent header; libcurl's default when missing.
    #[serde(default)]
    pub user_agent: Option<String>,
}

fn default_probe_head() -> bool {
    true
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            update_interval_secs: DEFAULT_UPDATE_INTERVAL.as_secs_f64(),
            progress_interval_ms: 500,
            connect_timeout_secs: 30,
            low_speed_limit: 1024,
            low_speed_time_secs: 60,
            max_redirections: 10,
            probe_head: true,
            user_agent: None,
        }
    }
}

impl FetchConfig {
    /// Recompute interval as a `Duration`. Negative or non-finite values fall back to the default.
    pub fn update_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.update_interval_secs).unwrap_or(DEFAULT_UPDATE_INTERVAL)
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("fetchmeter")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<FetchConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = FetchConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: FetchConfig = toml::from_str(&data)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = FetchConfig::default();
        assert_eq!(cfg.update_interval(), Duration::from_secs(2));
        assert_eq!(cfg.progress_interval(), Duration::from_millis(500));
        assert_eq!(cfg.connect_timeout_secs, 30);
        assert_eq!(cfg.max_redirections, 10);
        assert!(cfg.probe_head);
        assert!(cfg.user_agent.is_none());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = FetchConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: FetchConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.update_interval_secs, cfg.update_interval_secs);
        assert_eq!(parsed.progress_interval_ms, cfg.progress_interval_ms);
        assert_eq!(parsed.low_speed_limit, cfg.low_speed_limit);
        assert_eq!(parsed.probe_head, cfg.probe_head);
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            update_interval_secs = 0.5
            progress_interval_ms = 100
            connect_timeout_secs = 5
            low_speed_limit = 10
            low_speed_time_secs = 20
            max_redirections = 3
            user_agent = "fetchmeter-test/1.0"
        "#;
        let cfg: FetchConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.update_interval(), Duration::from_millis(500));
        assert_eq!(cfg.progress_interval(), Duration::from_millis(100));
        assert_eq!(cfg.max_redirections, 3);
        assert!(cfg.probe_head);
        assert_eq!(cfg.user_agent.as_deref(), Some("fetchmeter-test/1.0"));
    }

    #[test]
    fn invalid_update_interval_falls_back_to_default() {
        let mut cfg = FetchConfig::default();
        cfg.update_interval_secs = -1.0;
        assert_eq!(cfg.update_interval(), DEFAULT_UPDATE_INTERVAL);
        cfg.update_interval_secs = f64::NAN;
        assert_eq!(cfg.update_interval(), DEFAULT_UPDATE_INTERVAL);
    }
}
