//! ## Error Module
//!
//! Defines [`PanelError`], the top-level error type of the command panel, and
//! [`PanelErrorKind`], which categorises what went wrong.
//!
//! Malformed frames are not represented here: they are dropped at the dispatcher and never
//! leave the main loop.

use std::fmt;

pub type PanelResult<T> = Result<T, PanelError>;

/// What part of the panel failed.
#[derive(Debug)]
pub enum PanelErrorKind {
    /// The configuration file could not be read or deserialized.
    Config(ext_config::ConfigError),
    /// The backend URL is not a usable WebSocket URL.
    InvalidBackendUrl(String),
    /// An I/O operation failed, most often terminal setup or drawing.
    Io(std::io::Error),
    /// The monitoring server could not be created or crashed.
    Monitoring(String),
    /// Logging could not be initialised.
    Logging(String),
}

/// Error raised by the command panel outside of frame handling.
#[derive(Debug)]
pub struct PanelError {
    pub kind: PanelErrorKind,
}

impl PanelError {
    pub fn new(kind: PanelErrorKind) -> Self {
        Self { kind }
    }
}

impl fmt::Display for PanelErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PanelErrorKind::Config(e) => write!(f, "Invalid configuration: {e}"),
            PanelErrorKind::InvalidBackendUrl(url) => {
                write!(f, "Backend URL must start with ws:// or wss://, got `{url}`")
            }
            PanelErrorKind::Io(e) => write!(f, "I/O error: {e}"),
            PanelErrorKind::Monitoring(e) => write!(f, "Monitoring server error: {e}"),
            PanelErrorKind::Logging(e) => write!(f, "Could not initialise logging: {e}"),
        }
    }
}

impl fmt::Display for PanelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)
    }
}

impl std::error::Error for PanelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            PanelErrorKind::Config(e) => Some(e),
            PanelErrorKind::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PanelErrorKind> for PanelError {
    fn from(kind: PanelErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<ext_config::ConfigError> for PanelError {
    fn from(e: ext_config::ConfigError) -> Self {
        Self::new(PanelErrorKind::Config(e))
    }
}

impl From<std::io::Error> for PanelError {
    fn from(e: std::io::Error) -> Self {
        Self::new(PanelErrorKind::Io(e))
    }
}
