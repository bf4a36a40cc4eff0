//! tokenward CLI - keeps a refreshed access token for authenticated requests

mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use commands::Commands;
use std::path::PathBuf;
use std::time::Duration;
use tokenward_core::logging::{InstrumentationConfig, init_tracing};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "tokenward")]
#[command(about = "Refresh access tokens and make authenticated requests")]
#[command(version)]
struct Cli {
    /// Set logging level (defaults to `log_level` from the configuration)
    #[arg(short = 'l', long, global = true)]
    log_level: Option<LogLevel>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Configuration file (defaults to tokenward.toml if present)
    #[arg(short = 'c', long, global = true, env = "TOKENWARD_CONFIG")]
    config: Option<PathBuf>,

    /// Override the API base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Directory holding persisted credentials
    #[arg(short = 'd', long, global = true)]
    data_dir: Option<PathBuf>,

    /// Timeout for the whole command in seconds (0 = no timeout)
    #[arg(short = 't', long, global = true, default_value = "30")]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = config::Settings {
        config_path: cli.config,
        base_url: cli.base_url,
        data_dir: cli.data_dir,
    };

    let log_level = settings.log_level(cli.log_level.map(LogLevel::as_str));
    init_tracing(&InstrumentationConfig {
        json: cli.log_json,
        ..InstrumentationConfig::with_log_level(&log_level)
    })?;

    let outcome = if cli.timeout == 0 {
        cli.command.execute(settings).await
    } else {
        let timeout_duration = Duration::from_secs(cli.timeout);
        match tokio::time::timeout(timeout_duration, cli.command.execute(settings)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                error!("Command timed out after {} seconds", cli.timeout);
                std::process::exit(1);
            }
        }
    };

    match outcome {
        Ok(()) => {
            info!("Command completed successfully");
            Ok(())
        }
        Err(e) => {
            error!("Command failed: {e:#}");
            std::process::exit(1);
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}
