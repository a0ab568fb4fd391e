//! HTTP download session.
//!
//! Owns one libcurl handle with the cookie engine enabled, so a form login
//! and the download that follows share cookies. `run` drives one download
//! through the status machine, feeds every body chunk into a
//! `DownloadTimeCalculator`, and publishes progress on an event channel.
//! Everything here blocks; call it from `spawn_blocking` in async code.

mod auth;
mod error;
mod head;
mod transfer;

use std::str;
use std::time::{Duration, Instant};

use curl::easy::{Auth, Easy};

use crate::calculator::DownloadTimeCalculator;
use crate::config::FetchConfig;
use crate::control::CancelToken;
use crate::destination::{Destination, PartFile};
use crate::events::{average_speed, DownloadSummary, EventSender};
use crate::status::{DownloadStatus, StatusMachine};

pub use auth::{Cookie, Credentials, LoginForm, ParseCookieError};
pub use error::DownloadError;
pub use head::HeadInfo;

/// One download to perform.
#[derive(Debug, Clone)]
pub struct DownloadRequest<T> {
    pub url: String,
    pub destination: Destination,
    pub credentials: Option<Credentials>,
    pub cookies: Vec<Cookie>,
    pub login: Option<LoginForm>,
    /// Opaque token handed back in the summary.
    pub user_state: T,
}

impl<T> DownloadRequest<T> {
    pub fn new(url: impl Into<String>, destination: Destination, user_state: T) -> Self {
        Self {
            url: url.into(),
            destination,
            credentials: None,
            cookies: Vec::new(),
            login: None,
            user_state,
        }
    }
}

/// Blocking HTTP session. Cookies received by any request are kept for the
/// following ones; credentials and cookies of a `DownloadRequest` apply to
/// that request only.
pub struct DownloadSession {
    easy: Easy,
    config: FetchConfig,
}

impl DownloadSession {
    pub fn new(config: FetchConfig) -> Result<Self, DownloadError> {
        let mut easy = Easy::new();
        configure(&mut easy, &config)?;
        Ok(Self { easy, config })
    }

    /// Drop per-request options (credentials, cookies, POST state) left by
    /// an earlier request. Cookies collected by the cookie engine survive.
    fn reset_request_options(&mut self) -> Result<(), DownloadError> {
        self.easy.reset();
        configure(&mut self.easy, &self.config)
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Use HTTP basic authentication for this and later requests.
    pub fn set_credentials(&mut self, credentials: &Credentials) -> Result<(), DownloadError> {
        let mut auth = Auth::new();
        auth.basic(true);
        self.easy.http_auth(&auth)?;
        self.easy.username(&credentials.username)?;
        self.easy.password(&credentials.password)?;
        Ok(())
    }

    /// Send `cookies` with this and later requests, in addition to the ones
    /// collected by the cookie engine.
    pub fn set_cookies(&mut self, cookies: &[Cookie]) -> Result<(), DownloadError> {
        if !cookies.is_empty() {
            self.easy.cookie(&auth::cookie_header(cookies))?;
        }
        Ok(())
    }

    /// POST the login form. Cookies from the response stay in the session.
    pub fn login(&mut self, form: &LoginForm) -> Result<(), DownloadError> {
        tracing::debug!(url = %form.url, "logging in");
        let body = form.encoded_body();
        self.easy.url(&form.url)?;
        self.easy.post(true)?;
        self.easy.post_fields_copy(body.as_bytes())?;
        let performed = {
            let mut transfer = self.easy.transfer();
            transfer.write_function(|data| Ok(data.len()))?;
            transfer.perform()
        };
        performed.map_err(|e| self.map_perform_error(e))?;
        let code = self.easy.response_code()?;
        if !(200..300).contains(&code) {
            return Err(DownloadError::Http(code));
        }
        Ok(())
    }

    /// HEAD request for size and file name hints.
    pub fn probe(&mut self, url: &str) -> Result<HeadInfo, DownloadError> {
        let mut lines: Vec<String> = Vec::new();
        self.easy.url(url)?;
        self.easy.get(true)?;
        self.easy.nobody(true)?;
        let performed = {
            let mut transfer = self.easy.transfer();
            transfer.header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    lines.push(s.trim_end().to_string());
                }
                true
            })?;
            transfer.perform()
        };
        performed.map_err(|e| self.map_perform_error(e))?;
        let info = head::parse_head(&lines);
        tracing::debug!(url, content_length = ?info.content_length, "probe done");
        Ok(info)
    }

    /// Run one download to a terminal status. Never fails: any error after
    /// the transfer started ends as `Broken` with the error text in the summary.
    pub fn run<T: Clone>(
        &mut self,
        request: DownloadRequest<T>,
        cancel: &CancelToken,
        events: &EventSender<T>,
    ) -> DownloadSummary<T> {
        let mut machine = StatusMachine::new();
        advance(&mut machine, events, DownloadStatus::Downloading);
        let start = Instant::now();
        let mut calc = DownloadTimeCalculator::with_update_interval(
            start,
            0,
            self.config.update_interval(),
        );
        let mut path = request.destination.resolve(&request.url, None);

        let outcome = self.download(&request, start, cancel, events, &mut calc, &mut path);

        let elapsed = start.elapsed();
        let (status, bytes_received, error) = match outcome {
            Ok(bytes) => (DownloadStatus::Completed, bytes, None),
            Err((DownloadError::Cancelled, bytes)) => (DownloadStatus::Cancelled, bytes, None),
            Err((e, bytes)) => (DownloadStatus::Broken, bytes, Some(e.to_string())),
        };
        advance(&mut machine, events, status);

        match &error {
            Some(e) => tracing::warn!(url = %request.url, bytes = bytes_received, "download broken: {}", e),
            None => tracing::info!(
                url = %request.url,
                bytes = bytes_received,
                status = %status,
                elapsed_ms = elapsed.as_millis() as u64,
                "download finished"
            ),
        }

        let summary = DownloadSummary {
            status,
            average_speed: average_speed(bytes_received, elapsed),
            elapsed,
            bytes_received,
            cancelled: status == DownloadStatus::Cancelled,
            error,
            path,
            user_state: request.user_state,
        };
        events.finished(summary.clone());
        summary
    }

    /// Login, probe, transfer, finalize. On failure returns the error together
    /// with the number of bytes received before it.
    fn download<T>(
        &mut self,
        request: &DownloadRequest<T>,
        start: Instant,
        cancel: &CancelToken,
        events: &EventSender<T>,
        calc: &mut DownloadTimeCalculator,
        path: &mut std::path::PathBuf,
    ) -> Result<u64, (DownloadError, u64)> {
        let before_transfer = |e: DownloadError| (e, 0u64);

        self.reset_request_options().map_err(before_transfer)?;
        if let Some(credentials) = &request.credentials {
            self.set_credentials(credentials).map_err(before_transfer)?;
        }
        self.set_cookies(&request.cookies).map_err(before_transfer)?;
        if let Some(form) = &request.login {
            self.login(form).map_err(before_transfer)?;
        }

        let mut named_by_probe = false;
        if self.config.probe_head {
            match self.probe(&request.url) {
                Ok(info) => {
                    named_by_probe = info.content_disposition.is_some();
                    *calc = DownloadTimeCalculator::with_update_interval(
                        start,
                        info.content_length.unwrap_or(0),
                        self.config.update_interval(),
                    );
                    *path = request
                        .destination
                        .resolve(&request.url, info.content_disposition.as_deref());
                }
                Err(e) => tracing::warn!(url = %request.url, "HEAD probe failed, size unknown: {}", e),
            }
        }
        if cancel.is_cancelled() {
            return Err((DownloadError::Cancelled, 0u64));
        }

        let mut part = PartFile::create(path).map_err(|e| before_transfer(e.into()))?;
        self.easy.url(&request.url).map_err(|e| before_transfer(e.into()))?;
        let result = transfer::get_into(
            &mut self.easy,
            &mut part,
            calc,
            events,
            cancel,
            self.config.progress_interval(),
        );
        let received = part.written();
        match result {
            Ok(fetched) => {
                let bytes = fetched.bytes;
                if let (false, Some(cd)) = (named_by_probe, fetched.content_disposition) {
                    let named = request.destination.resolve(&request.url, Some(&cd));
                    if named != *path {
                        part.set_final_path(named.clone());
                        *path = named;
                    }
                }
                part.finalize()
                    .map_err(|e| (DownloadError::Storage(e), bytes))?;
                Ok(bytes)
            }
            Err(e) => {
                part.discard();
                Err((e, received))
            }
        }
    }

    fn map_perform_error(&mut self, e: curl::Error) -> DownloadError {
        if e.is_http_returned_error() {
            if let Ok(code) = self.easy.response_code() {
                return DownloadError::Http(code);
            }
        }
        DownloadError::Curl(e)
    }
}

/// Session-wide handle options, applied on creation and after every reset.
fn configure(easy: &mut Easy, config: &FetchConfig) -> Result<(), DownloadError> {
    // Empty file name: enable the in-memory cookie engine without reading a file.
    easy.cookie_file("")?;
    easy.follow_location(true)?;
    easy.max_redirections(config.max_redirections)?;
    easy.connect_timeout(Duration::from_secs(config.connect_timeout_secs))?;
    easy.low_speed_limit(config.low_speed_limit)?;
    easy.low_speed_time(Duration::from_secs(config.low_speed_time_secs))?;
    easy.fail_on_error(true)?;
    if let Some(ua) = &config.user_agent {
        easy.useragent(ua)?;
    }
    Ok(())
}

/// Apply a transition and publish it. Rejections are logged, never raised.
fn advance<T>(machine: &mut StatusMachine, events: &EventSender<T>, next: DownloadStatus) {
    match machine.transition(next) {
        Ok(change) => events.status(change),
        Err(e) => tracing::warn!("{}", e),
    }
}
