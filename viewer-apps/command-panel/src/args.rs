use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;
use command_panel::{config::CommandPanelConfig, error::PanelResult};

#[derive(Parser, Debug)]
#[command(name = "command-panel")]
#[command(about = "Live throughput and security alert dashboard")]
pub struct Args {
    /// Path to the TOML configuration file
    #[arg(short = 'c', long = "config")]
    pub config_path: Option<PathBuf>,

    /// Backend WebSocket URL, overrides `backend_url`
    #[arg(long = "backend-url")]
    pub backend_url: Option<String>,

    /// Run without the terminal UI and log state changes to stdout
    #[arg(long)]
    pub headless: bool,

    /// Write logs to this file
    #[arg(short = 'f', long = "log-file")]
    pub log_file: Option<PathBuf>,

    /// Serve the monitoring API on this address, overrides `monitoring_address`
    #[arg(long = "monitoring-address")]
    pub monitoring_address: Option<SocketAddr>,
}

/// Loads the config file (if any) and applies the command-line overrides.
pub fn process_cli_args() -> PanelResult<CommandPanelConfig> {
    let args = Args::parse();
    build_config(args)
}

fn build_config(args: Args) -> PanelResult<CommandPanelConfig> {
    let mut config = match args.config_path.as_deref() {
        Some(path) => CommandPanelConfig::from_file(path)?,
        None => CommandPanelConfig::default(),
    };
    config.set_backend_url(args.backend_url);
    config.set_headless(args.headless);
    config.set_log_file(args.log_file);
    config.set_monitoring_address(args.monitoring_address);
    config.validate()?;
    Ok(config)
}
