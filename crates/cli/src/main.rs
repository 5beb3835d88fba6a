//! Pledge CLI - session and API access for the Pledge crowdfunding backends

mod commands;
mod config;
mod logging;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use commands::{Commands, Context};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{Level, error, info};

#[derive(Parser)]
#[command(name = "pledge")]
#[command(about = "Command-line client for the Pledge crowdfunding platform")]
#[command(version)]
struct Cli {
    /// Set logging level
    #[arg(short = 'l', long, global = true, default_value = "info")]
    log_level: LogLevel,

    /// Configuration file (TOML, YAML or JSON)
    #[arg(short = 'c', long, global = true, env = "PLEDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory for the session file and logs
    #[arg(short = 'd', long, global = true, env = "PLEDGE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Timeout for the whole command in seconds (0 = no timeout)
    #[arg(short = 't', long, global = true, default_value = "30")]
    timeout: u64,

    /// Disable file logging (only log to stderr)
    #[arg(long, global = true)]
    no_file_log: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let data_dir = config::data_dir(cli.data_dir.clone());
    logging::init_logging(cli.log_level.into(), &data_dir, cli.no_file_log)?;

    let context = Context::load(cli.config, cli.data_dir, data_dir)?;
    info!("Starting Pledge CLI");

    if cli.timeout == 0 {
        match cli.command.execute(&context).await {
            Ok(()) => {
                info!("Command completed successfully");
            }
            Err(e) => {
                error!("Command failed: {e:#}");
                std::process::exit(1);
            }
        }
    } else {
        let timeout_duration = Duration::from_secs(cli.timeout);
        match tokio::time::timeout(timeout_duration, cli.command.execute(&context)).await {
            Ok(Ok(())) => {
                info!("Command completed successfully");
            }
            Ok(Err(e)) => {
                error!("Command failed: {e:#}");
                std::process::exit(1);
            }
            Err(_) => {
                error!("Command timed out after {} seconds", cli.timeout);
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

#[derive(Clone, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(log_level: LogLevel) -> Self {
        match log_level {
            LogLevel::Error => Self::ERROR,
            LogLevel::Warn => Self::WARN,
            LogLevel::Info => Self::INFO,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Trace => Self::TRACE,
        }
    }
}
