//! GET transfer: stream the body into the `.part` file and feed the calculator.

use std::cell::{Cell, RefCell};
use std::io;
use std::str;
use std::time::{Duration, Instant};

use curl::easy::{Easy, WriteError};

use crate::calculator::DownloadTimeCalculator;
use crate::control::CancelToken;
use crate::destination::PartFile;
use crate::events::EventSender;
use crate::progress::DownloadProgress;

use super::error::DownloadError;
use super::head::{header_value, is_status_line};

/// Per-chunk state of a running transfer.
struct ChunkSink<'a, T> {
    part: &'a mut PartFile,
    calc: &'a mut DownloadTimeCalculator,
    events: &'a EventSender<T>,
    cancel: &'a CancelToken,
    header_length: &'a Cell<Option<u64>>,
    progress_interval: Duration,
    last_publish: Option<Instant>,
    published_bytes: Option<u64>,
    storage_error: Option<io::Error>,
}

/// What a finished GET produced.
pub(super) struct Fetched {
    pub bytes: u64,
    /// `Content-Disposition` of the final response, if any.
    pub content_disposition: Option<String>,
}

impl<T> ChunkSink<'_, T> {
    /// Returning fewer bytes than given makes libcurl abort with a write error.
    fn on_chunk(&mut self, data: &[u8]) -> Result<usize, WriteError> {
        if self.cancel.is_cancelled() {
            return Ok(0);
        }
        if let Some(len) = self.header_length.get() {
            self.calc.set_total_bytes(len);
        }
        let received = match self.part.append(data) {
            Ok(n) => n,
            Err(e) => {
                self.storage_error = Some(e);
                return Ok(0);
            }
        };

        let now = Instant::now();
        self.calc.update_at(received, now);
        if self.due(received, now) {
            self.publish(received, now);
        }
        Ok(data.len())
    }

    fn publish(&mut self, received: u64, now: Instant) {
        self.events
            .progress(DownloadProgress::from_calculator(self.calc, received, now));
        self.last_publish = Some(now);
        self.published_bytes = Some(received);
    }

    /// First chunk and final byte always publish; otherwise once per interval.
    fn due(&self, received: u64, now: Instant) -> bool {
        let total = self.calc.total_bytes();
        if total > 0 && received >= total {
            return true;
        }
        match self.last_publish {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.progress_interval,
        }
    }
}

/// Perform the GET configured on `easy`.
pub(super) fn get_into<T>(
    easy: &mut Easy,
    part: &mut PartFile,
    calc: &mut DownloadTimeCalculator,
    events: &EventSender<T>,
    cancel: &CancelToken,
    progress_interval: Duration,
) -> Result<Fetched, DownloadError> {
    easy.nobody(false)?;
    easy.get(true)?;
    easy.progress(true)?;

    let header_length = Cell::new(None);
    let content_disposition = RefCell::new(None);
    let mut sink = ChunkSink {
        part,
        calc,
        events,
        cancel,
        header_length: &header_length,
        progress_interval,
        last_publish: None,
        published_bytes: None,
        storage_error: None,
    };

    let performed = {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            if let Ok(line) = str::from_utf8(data) {
                let line = line.trim();
                if is_status_line(line) {
                    header_length.set(None);
                    content_disposition.replace(None);
                } else if let Some(v) = header_value(line, "content-length") {
                    header_length.set(v.parse().ok());
                } else if let Some(v) = header_value(line, "content-disposition") {
                    content_disposition.replace(Some(v.to_string()));
                }
            }
            true
        })?;
        transfer.write_function(|data| sink.on_chunk(data))?;
        // Fires about once per second even when no data arrives, so a stalled
        // transfer still notices cancellation.
        transfer.progress_function(|_, _, _, _| !cancel.is_cancelled())?;
        transfer.perform()
    };

    if let Err(e) = performed {
        if cancel.is_cancelled() && (e.is_write_error() || e.is_aborted_by_callback()) {
            return Err(DownloadError::Cancelled);
        }
        if e.is_write_error() {
            if let Some(io_err) = sink.storage_error.take() {
                return Err(DownloadError::Storage(io_err));
            }
        }
        if e.is_http_returned_error() {
            return Err(DownloadError::Http(easy.response_code()?));
        }
        return Err(DownloadError::Curl(e));
    }

    let code = easy.response_code()?;
    if !(200..300).contains(&code) {
        return Err(DownloadError::Http(code));
    }

    // An empty body never reaches on_chunk; pick up the header size here.
    if let Some(len) = header_length.get() {
        sink.calc.set_total_bytes(len);
    }
    let received = sink.part.written();
    let expected = sink.calc.total_bytes();
    if expected > 0 && received != expected {
        return Err(DownloadError::PartialTransfer { expected, received });
    }
    // Without a known size no chunk counts as the last one.
    if sink.published_bytes != Some(received) {
        sink.publish(received, Instant::now());
    }
    Ok(Fetched {
        bytes: received,
        content_disposition: content_disposition.into_inner(),
    })
}
