//! ## Command Panel Configuration Module
//!
//! Defines [`CommandPanelConfig`], the configuration structure for the command panel.
//!
//! Every key is optional; an empty file (or no file at all) yields a panel that connects to
//! `ws://localhost:8000/ws/data`, keeps 60 throughput samples and 50 alerts, and reconnects
//! every 5 seconds.
use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};

use apollo_apps::{
    config_helpers::opt_path_from_toml,
    stores::{DEFAULT_ALERT_LOG_LEN, DEFAULT_THROUGHPUT_HISTORY_LEN},
    DEFAULT_BACKEND_URL, DEFAULT_RECONNECT_DELAY_SECS,
};
use serde::Deserialize;

use crate::error::{PanelErrorKind, PanelResult};

/// Configuration for the command panel.
#[derive(Debug, Deserialize, Clone)]
pub struct CommandPanelConfig {
    /// WebSocket endpoint of the backend.
    #[serde(default = "default_backend_url")]
    backend_url: String,
    /// Fixed delay before reconnecting after the link drops.
    #[serde(default = "default_reconnect_delay_secs")]
    reconnect_delay_secs: u64,
    /// Number of throughput samples shown on the chart.
    #[serde(default = "default_throughput_history_len")]
    throughput_history_len: usize,
    /// Number of alerts kept in the log.
    #[serde(default = "default_alert_log_len")]
    alert_log_len: usize,
    /// Minimum delay between two terminal redraws.
    #[serde(default = "default_render_interval_ms")]
    render_interval_ms: u64,
    /// Run without the terminal UI, logging state changes instead.
    #[serde(default)]
    headless: bool,
    /// The path to the log file.
    #[serde(default, deserialize_with = "opt_path_from_toml")]
    log_file: Option<PathBuf>,
    /// Optional monitoring server bind address
    #[serde(default)]
    monitoring_address: Option<SocketAddr>,
    #[serde(default = "default_monitoring_cache_refresh_secs")]
    monitoring_cache_refresh_secs: u64,
    #[serde(skip)]
    reconnect_delay_override: Option<Duration>,
}

fn default_backend_url() -> String {
    DEFAULT_BACKEND_URL.to_string()
}

fn default_reconnect_delay_secs() -> u64 {
    DEFAULT_RECONNECT_DELAY_SECS
}

fn default_throughput_history_len() -> usize {
    DEFAULT_THROUGHPUT_HISTORY_LEN
}

fn default_alert_log_len() -> usize {
    DEFAULT_ALERT_LOG_LEN
}

fn default_render_interval_ms() -> u64 {
    250
}

fn default_monitoring_cache_refresh_secs() -> u64 {
    15
}

impl Default for CommandPanelConfig {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            reconnect_delay_secs: default_reconnect_delay_secs(),
            throughput_history_len: default_throughput_history_len(),
            alert_log_len: default_alert_log_len(),
            render_interval_ms: default_render_interval_ms(),
            headless: false,
            log_file: None,
            monitoring_address: None,
            monitoring_cache_refresh_secs: default_monitoring_cache_refresh_secs(),
            reconnect_delay_override: None,
        }
    }
}

impl CommandPanelConfig {
    /// Loads the configuration from a TOML file.
    pub fn from_file(path: &Path) -> PanelResult<Self> {
        let config = ext_config::Config::builder()
            .add_source(ext_config::File::from(path).format(ext_config::FileFormat::Toml))
            .build()?
            .try_deserialize::<Self>()?;
        config.validate()?;
        Ok(config)
    }

    /// Parses the configuration from TOML text.
    pub fn from_toml_str(toml: &str) -> PanelResult<Self> {
        let config = ext_config::Config::builder()
            .add_source(ext_config::File::from_str(
                toml,
                ext_config::FileFormat::Toml,
            ))
            .build()?
            .try_deserialize::<Self>()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the connection manager cannot use.
    pub fn validate(&self) -> PanelResult<()> {
        let url = self.backend_url.trim();
        if !(url.starts_with("ws://") || url.starts_with("wss://")) {
            return Err(PanelErrorKind::InvalidBackendUrl(self.backend_url.clone()).into());
        }
        Ok(())
    }

    /// Creates a headless config pointed at `backend_url`, everything else defaulted.
    pub fn new(backend_url: String) -> Self {
        Self {
            backend_url,
            headless: true,
            ..Default::default()
        }
    }

    /// Returns the backend WebSocket URL.
    pub fn backend_url(&self) -> &str {
        &self.backend_url
    }

    pub fn set_backend_url(&mut self, backend_url: Option<String>) {
        if let Some(backend_url) = backend_url {
            self.backend_url = backend_url;
        }
    }

    /// Returns the fixed reconnect delay.
    pub fn reconnect_delay(&self) -> Duration {
        self.reconnect_delay_override
            .unwrap_or(Duration::from_secs(self.reconnect_delay_secs))
    }

    /// Overrides the reconnect delay with sub-second precision.
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay_override = Some(delay);
        self
    }

    pub fn throughput_history_len(&self) -> usize {
        self.throughput_history_len
    }

    pub fn alert_log_len(&self) -> usize {
        self.alert_log_len
    }

    pub fn render_interval(&self) -> Duration {
        Duration::from_millis(self.render_interval_ms.max(16))
    }

    pub fn headless(&self) -> bool {
        self.headless
    }

    pub fn set_headless(&mut self, headless: bool) {
        self.headless = self.headless || headless;
    }

    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }

    pub fn set_log_file(&mut self, log_file: Option<PathBuf>) {
        if let Some(log_file) = log_file {
            self.log_file = Some(log_file);
        }
    }

    /// Returns the monitoring server bind address (if enabled)
    pub fn monitoring_address(&self) -> Option<SocketAddr> {
        self.monitoring_address
    }

    pub fn set_monitoring_address(&mut self, monitoring_address: Option<SocketAddr>) {
        if monitoring_address.is_some() {
            self.monitoring_address = monitoring_address;
        }
    }

    pub fn monitoring_cache_refresh_secs(&self) -> u64 {
        self.monitoring_cache_refresh_secs.max(1)
    }
}
