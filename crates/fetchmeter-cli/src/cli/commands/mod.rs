//! CLI command handlers.

mod config;
mod get;
mod probe;

pub use config::run_config;
pub use get::run_get;
pub use probe::run_probe;
