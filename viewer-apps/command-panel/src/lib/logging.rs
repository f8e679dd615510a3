//! Tracing subscriber setup.
//!
//! Logs go to `log_file` when one is configured. Otherwise headless runs log to stdout and
//! terminal runs discard them, since any write to stdout would tear the rendered panel.

use std::{fs::OpenOptions, sync::Mutex};

use tracing_subscriber::EnvFilter;

use crate::{
    config::CommandPanelConfig,
    error::{PanelErrorKind, PanelResult},
};

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &CommandPanelConfig) -> PanelResult<()> {
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter());

    let result = if let Some(path) = config.log_file() {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                PanelErrorKind::Logging(format!("cannot open log file {}: {e}", path.display()))
            })?;
        builder
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init()
    } else if config.headless() {
        builder.try_init()
    } else {
        builder.with_writer(std::io::sink).try_init()
    };

    result.map_err(|e| PanelErrorKind::Logging(e.to_string()).into())
}
