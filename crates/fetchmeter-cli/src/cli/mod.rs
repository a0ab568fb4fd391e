//! CLI for fetchmeter.

mod commands;
mod display;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use fetchmeter_core::config;
use std::path::PathBuf;

use commands::{run_config, run_get, run_probe};

/// Top-level CLI for fetchmeter.
#[derive(Debug, Parser)]
#[command(name = "fetchmeter")]
#[command(about = "fetchmeter: HTTP downloads with live speed and ETA", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download a URL, showing progress, speed and remaining time.
    Get(GetArgs),

    /// Send a HEAD request and show size and file name hints.
    Probe {
        /// Direct HTTP/HTTPS URL.
        url: String,
    },

    /// Show the config file path and effective settings.
    Config,
}

#[derive(Debug, Args)]
pub struct GetArgs {
    /// Direct HTTP/HTTPS URL to download.
    pub url: String,

    /// Output file, or an existing directory to save into (default: current directory).
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// User name for HTTP basic authentication.
    #[arg(long, requires = "password")]
    pub user: Option<String>,

    /// Password for HTTP basic authentication.
    #[arg(long, requires = "user")]
    pub password: Option<String>,

    /// Cookie sent with every request (repeatable).
    #[arg(long = "cookie", value_name = "NAME=VALUE")]
    pub cookies: Vec<String>,

    /// Form login URL to POST before downloading; its cookies are reused.
    #[arg(long, value_name = "URL")]
    pub login_url: Option<String>,

    /// Form field for the login POST (repeatable).
    #[arg(long = "login-field", value_name = "NAME=VALUE", requires = "login_url")]
    pub login_fields: Vec<String>,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Get(args) => run_get(&cfg, args).await?,
            CliCommand::Probe { url } => run_probe(&cfg, &url).await?,
            CliCommand::Config => run_config(&cfg)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
