//! `fetchmeter probe <url>` – HEAD request metadata.

use anyhow::{Context, Result};
use fetchmeter_core::config::FetchConfig;
use fetchmeter_core::destination::derive_filename;
use fetchmeter_core::DownloadSession;

use crate::cli::display::format_bytes;

pub async fn run_probe(cfg: &FetchConfig, url: &str) -> Result<()> {
    let info = tokio::task::spawn_blocking({
        let cfg = cfg.clone();
        let url = url.to_string();
        move || DownloadSession::new(cfg)?.probe(&url)
    })
    .await
    .context("probe task join")??;

    let size = info
        .content_length
        .map(|n| format!("{} ({} bytes)", format_bytes(n), n))
        .unwrap_or_else(|| "unknown".to_string());
    println!("Size:          {}", size);
    println!(
        "Content-Type:  {}",
        info.content_type.as_deref().unwrap_or("-")
    );
    println!(
        "Last-Modified: {}",
        info.last_modified.as_deref().unwrap_or("-")
    );
    println!(
        "File name:     {}",
        derive_filename(url, info.content_disposition.as_deref())
    );
    Ok(())
}
