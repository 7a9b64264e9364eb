//! Tether CLI - authenticated requests against a Tether-backed API

mod commands;
mod config;
mod logging;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use commands::Commands;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{Level, debug, error};

#[derive(Parser)]
#[command(name = "tether")]
#[command(about = "Authenticated requests with automatic token renewal")]
#[command(version)]
struct Cli {
    /// Set logging level
    #[arg(short = 'l', long, global = true, default_value = "info")]
    log_level: LogLevel,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Directory holding the stored credentials
    #[arg(short = 'd', long, global = true, env = "TETHER_STATE_DIR")]
    data_dir: Option<PathBuf>,

    /// Endpoint configuration file (TOML or YAML)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Request timeout in seconds (0 = no timeout)
    #[arg(short = 't', long, global = true, default_value = "0")]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init_logging(cli.log_level.into(), cli.json_logs)?;

    let context = commands::Context {
        data_dir: config::resolve_data_dir(cli.data_dir)?,
        config_file: cli.config,
        timeout: (cli.timeout > 0).then(|| Duration::from_secs(cli.timeout)),
    };

    match cli.command.execute(context).await {
        Ok(()) => {
            debug!("Command completed successfully");
        }
        Err(e) => {
            error!("Command failed: {e:#}");
            std::process::exit(1);
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
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_have_no_timeout_by_default() {
        let cli = Cli::try_parse_from(["tether", "tokens"]).unwrap();
        assert_eq!(cli.timeout, 0);

        let cli = Cli::try_parse_from(["tether", "--timeout", "5", "tokens"]).unwrap();
        assert_eq!(cli.timeout, 5);
    }
}
