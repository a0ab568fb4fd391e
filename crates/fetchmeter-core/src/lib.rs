pub mod config;
pub mod logging;

pub mod calculator;
pub mod control;
pub mod destination;
pub mod events;
pub mod progress;
pub mod session;
pub mod status;

pub use calculator::DownloadTimeCalculator;
pub use control::CancelToken;
pub use events::{DownloadEvent, DownloadSummary, EventSender};
pub use progress::DownloadProgress;
pub use session::{DownloadError, DownloadRequest, DownloadSession};
pub use status::{DownloadStatus, StatusChange, StatusMachine, TransitionError};
