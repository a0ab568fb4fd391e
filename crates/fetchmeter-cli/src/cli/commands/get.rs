//! `fetchmeter get <url>` – download with live progress.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use fetchmeter_core::config::FetchConfig;
use fetchmeter_core::destination::Destination;
use fetchmeter_core::session::{Cookie, Credentials, LoginForm};
use fetchmeter_core::{
    CancelToken, DownloadEvent, DownloadRequest, DownloadSession, DownloadStatus, EventSender,
};

use crate::cli::display::{progress_line, summary_line};
use crate::cli::GetArgs;

/// Event channel depth; progress beyond this is dropped, status events wait.
const EVENT_CHANNEL_CAPACITY: usize = 64;

pub async fn run_get(cfg: &FetchConfig, args: GetArgs) -> Result<()> {
    let destination = resolve_destination(args.output)?;
    let request = build_request(
        args.url,
        destination,
        args.user.zip(args.password),
        &args.cookies,
        args.login_url,
        &args.login_fields,
    )?;

    let cancel = CancelToken::new();
    let (tx, mut rx) = tokio::sync::mpsc::channel::<DownloadEvent<String>>(EVENT_CHANNEL_CAPACITY);
    let worker = tokio::task::spawn_blocking({
        let cfg = cfg.clone();
        let cancel = cancel.clone();
        move || -> Result<_> {
            let mut session = DownloadSession::new(cfg)?;
            Ok(session.run(request, &cancel, &EventSender::new(tx)))
        }
    });

    let ctrl_c = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received, cancelling download");
                cancel.cancel();
            }
        }
    });

    let mut stdout = std::io::stdout();
    while let Some(event) = rx.recv().await {
        match event {
            DownloadEvent::Status(change) => {
                tracing::debug!(from = %change.previous, to = %change.current, "status");
            }
            DownloadEvent::Progress(p) => {
                print!("\r{}  ", progress_line(&p));
                let _ = stdout.flush();
            }
            DownloadEvent::Finished(summary) => {
                println!();
                println!("{}", summary_line(&summary));
            }
        }
    }
    ctrl_c.abort();

    let summary = worker.await.context("download task join")??;
    match summary.status {
        DownloadStatus::Completed => Ok(()),
        DownloadStatus::Cancelled => anyhow::bail!("download of {} cancelled", summary.user_state),
        _ => anyhow::bail!(
            "download of {} failed: {}",
            summary.user_state,
            summary.error.as_deref().unwrap_or("unknown error")
        ),
    }
}

/// `-o` pointing at an existing directory saves into it; any other path is the file itself.
fn resolve_destination(output: Option<PathBuf>) -> Result<Destination> {
    Ok(match output {
        Some(p) if p.is_dir() => Destination::Directory(p),
        Some(p) => Destination::File(p),
        None => Destination::Directory(std::env::current_dir()?),
    })
}

/// Build the request from CLI values. The URL doubles as the correlation token.
pub(crate) fn build_request(
    url: String,
    destination: Destination,
    basic_auth: Option<(String, String)>,
    cookies: &[String],
    login_url: Option<String>,
    login_fields: &[String],
) -> Result<DownloadRequest<String>> {
    let mut request = DownloadRequest::new(url.clone(), destination, url);
    request.credentials = basic_auth.map(|(user, password)| Credentials::new(user, password));
    request.cookies = cookies
        .iter()
        .map(|c| c.parse::<Cookie>())
        .collect::<Result<_, _>>()?;
    if let Some(login_url) = login_url {
        let mut form = LoginForm::new(login_url);
        for field in login_fields {
            let (name, value) = field
                .split_once('=')
                .with_context(|| format!("invalid login field {:?}: expected NAME=VALUE", field))?;
            form = form.field(name, value);
        }
        request.login = Some(form);
    }
    Ok(request)
}
