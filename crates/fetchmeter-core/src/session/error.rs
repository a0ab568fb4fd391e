//! Errors raised by the HTTP session before they become a `Broken` summary.

/// Failure of a login, probe or transfer.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// libcurl reported an error (timeout, connection, TLS, ...).
    #[error("transport: {0}")]
    Curl(#[from] curl::Error),
    /// The server answered with a non-2xx status.
    #[error("HTTP {0}")]
    Http(u32),
    /// The body ended before the declared length was reached.
    #[error("partial transfer: expected {expected} bytes, got {received}")]
    PartialTransfer { expected: u64, received: u64 },
    /// Creating, writing or renaming the destination file failed.
    #[error("storage: {0}")]
    Storage(#[from] std::io::Error),
    /// The cancel token was set.
    #[error("download cancelled")]
    Cancelled,
}

impl DownloadError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DownloadError::Cancelled)
    }
}
